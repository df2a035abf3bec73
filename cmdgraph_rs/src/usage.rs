//! Text rendering of [`InvalidUsage`] reports for frontends.

use crate::error::InvalidUsage;

/// Render a usage report.
///
/// `prefix` is prepended to the alias path, e.g. `"/"` for chat commands.
/// A bare help request (no message, full help) skips the generic
/// "used incorrectly" line.
pub fn render_invalid_usage(usage: &InvalidUsage, prefix: &str) -> String {
    let description = usage.command.description();
    let usage_line = {
        let path = format!("{prefix}{}", usage.alias_stack.join(" "));
        let rendered = description.usage();
        ["Usage:", path.as_str(), rendered.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut lines = Vec::new();
    if usage.message.is_some() || !usage.full_help_suggested {
        lines.push(usage.to_string());
    }

    if usage.full_help_suggested {
        if let Some(short) = &description.short_description {
            lines.push(short.clone());
        }
        lines.push(usage_line);
        if let Some(help) = &description.help {
            lines.push(String::new());
            lines.push(help.clone());
        }
        if let Some(dispatcher) = usage.command.as_dispatcher() {
            let commands = dispatcher.commands();
            if !commands.is_empty() {
                lines.push(String::new());
                lines.push("Sub-commands:".to_string());
                let width = commands
                    .iter()
                    .map(|m| m.primary_alias().len())
                    .max()
                    .unwrap_or(0);
                for mapping in commands {
                    let summary = mapping
                        .description()
                        .short_description
                        .clone()
                        .unwrap_or_else(|| mapping.description().usage());
                    lines.push(
                        format!("  {:<width$}  {summary}", mapping.primary_alias())
                            .trim_end()
                            .to_string(),
                    );
                }
            }
        }
    } else {
        lines.push(usage_line);
    }

    if let Some(suggestion) = &usage.suggestion {
        lines.push(format!("Did you mean '{suggestion}'?"));
    }
    lines.join("\n")
}
