//! Configuration file support for cmdgraph hosts.
//!
//! Loads optional `.cmdgraph/config.toml` from a host's root directory.

use serde::Deserialize;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CmdgraphConfig {
    pub parsing: ParsingConfig,
    pub dispatch: DispatchConfig,
    pub completion: CompletionConfig,
}

/// Argument binding behaviour for leaf commands.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Flag that turns any leaf call into a full-help request.
    pub help_flag: char,
    /// Builder-wide default for tolerating flags no parameter claims.
    pub ignore_unused_flags: bool,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            help_flag: '?',
            ignore_unused_flags: false,
        }
    }
}

/// Routing behaviour for dispatcher nodes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Attach a "did you mean" alias to unresolved sub-command errors.
    pub suggest_similar: bool,
    /// Largest edit distance still considered similar.
    pub max_distance: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            suggest_similar: true,
            max_distance: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Accept a value flag with no value yet when computing suggestions.
    pub allow_hanging_flags: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            allow_hanging_flags: true,
        }
    }
}

impl CmdgraphConfig {
    /// Load config from `.cmdgraph/config.toml` in the given root directory.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(".cmdgraph").join("config.toml");
        Self::load_from_path(&config_path)
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CmdgraphConfig::default();
        assert_eq!(config.parsing.help_flag, '?');
        assert!(!config.parsing.ignore_unused_flags);
        assert!(config.dispatch.suggest_similar);
        assert_eq!(config.dispatch.max_distance, 2);
        assert!(config.completion.allow_hanging_flags);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        let config = CmdgraphConfig::load(temp.path());
        assert_eq!(config.parsing.help_flag, '?');
    }

    #[test]
    fn test_load_valid_config() {
        let temp = TempDir::new().expect("temp dir");
        let dir = temp.path().join(".cmdgraph");
        std::fs::create_dir_all(&dir).expect("create .cmdgraph");

        let config_path = dir.join("config.toml");
        let mut file = std::fs::File::create(&config_path).expect("create config");
        writeln!(
            file,
            r#"
[parsing]
help_flag = "h"
ignore_unused_flags = true

[dispatch]
max_distance = 1
"#
        )
        .expect("write config");

        let config = CmdgraphConfig::load(temp.path());
        assert_eq!(config.parsing.help_flag, 'h');
        assert!(config.parsing.ignore_unused_flags);
        assert_eq!(config.dispatch.max_distance, 1);
        // untouched keys keep their defaults
        assert!(config.dispatch.suggest_similar);
        assert!(config.completion.allow_hanging_flags);
    }

    #[test]
    fn test_load_invalid_config_returns_default() {
        let temp = TempDir::new().expect("temp dir");
        let config_path = temp.path().join("broken.toml");
        std::fs::write(&config_path, "[parsing\nhelp_flag = ").expect("write config");

        let config = CmdgraphConfig::load_from_path(&config_path);
        assert_eq!(config.parsing.help_flag, '?');
        assert_eq!(config.dispatch.max_distance, 2);
    }
}
