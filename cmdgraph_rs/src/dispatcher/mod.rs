//! Alias-indexed command tables and their composition into a tree.
//!
//! A [`SimpleDispatcher`] is itself a [`CommandCallable`], so a dispatcher
//! registered under an alias in another dispatcher is a command group.
//! Routing is a linear descent on leading tokens with no backtracking.

pub mod graph;

pub use graph::CommandGraph;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use strsim::levenshtein;
use tracing::{debug, trace};

use crate::command::{CommandCallable, CommandMapping};
use crate::config::CmdgraphConfig;
use crate::description::{Description, Parameter};
use crate::error::{CommandError, InvalidUsage, InvocationError, RegistrationError};
use crate::namespace::Namespace;
use crate::option_type::OptionType;
use crate::tokenizer::split_raw;

pub const NO_SUB_COMMANDS: &str = "This command has no sub-commands.";
pub const CHOOSE_SUB_COMMAND: &str = "Please choose a sub-command.";

pub struct SimpleDispatcher {
    /// Lowercased alias to mapping; every alias of a command maps to a clone
    /// of the same mapping.
    commands: BTreeMap<String, CommandMapping>,
    description: Description,
    suggest_similar: bool,
    max_distance: usize,
}

impl Default for SimpleDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleDispatcher {
    pub fn new() -> Self {
        let defaults = CmdgraphConfig::default();
        Self {
            commands: BTreeMap::new(),
            description: Description::builder()
                .parameters(vec![
                    Parameter::new("subcommand", OptionType::RequiredPositional, Vec::new()),
                    Parameter::new("...", OptionType::OptionalPositional, Vec::new()),
                ])
                .build(),
            suggest_similar: defaults.dispatch.suggest_similar,
            max_distance: defaults.dispatch.max_distance,
        }
    }

    pub fn with_config(mut self, config: &CmdgraphConfig) -> Self {
        self.suggest_similar = config.dispatch.suggest_similar;
        self.max_distance = config.dispatch.max_distance;
        self
    }

    pub fn set_short_description(&mut self, text: impl Into<String>) {
        self.description.short_description = Some(text.into());
    }

    /// Register `callable` under every alias. Fails without changing the
    /// table if any alias is already taken (case-insensitive).
    pub fn register_command<I>(
        &mut self,
        callable: Arc<dyn CommandCallable>,
        aliases: I,
    ) -> Result<(), RegistrationError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let aliases: Vec<String> = aliases
            .into_iter()
            .map(|alias| alias.as_ref().to_string())
            .collect();
        if aliases.is_empty() {
            return Err(RegistrationError::NoAliases);
        }

        let mut keys = HashSet::with_capacity(aliases.len());
        for alias in &aliases {
            let key = alias.to_lowercase();
            if self.commands.contains_key(&key) || !keys.insert(key) {
                return Err(RegistrationError::AliasTaken(alias.clone()));
            }
        }

        let mapping = CommandMapping::new(callable, aliases);
        for key in keys {
            self.commands.insert(key, mapping.clone());
        }
        debug!(aliases = ?mapping.all_aliases(), "command registered");
        Ok(())
    }

    pub fn get(&self, alias: &str) -> Option<&CommandMapping> {
        self.commands.get(&alias.to_lowercase())
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.commands.contains_key(&alias.to_lowercase())
    }

    /// One entry per registered command, sorted by primary alias.
    pub fn commands(&self) -> Vec<&CommandMapping> {
        // Each registration owns its primary alias key.
        let mut unique: Vec<&CommandMapping> = self
            .commands
            .iter()
            .filter(|(key, mapping)| **key == mapping.primary_alias().to_lowercase())
            .map(|(_, mapping)| mapping)
            .collect();
        unique.sort_by(|a, b| {
            a.primary_alias()
                .to_lowercase()
                .cmp(&b.primary_alias().to_lowercase())
        });
        unique
    }

    pub fn primary_aliases(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .map(|mapping| mapping.primary_alias().to_string())
            .collect()
    }

    /// Every registered key, lowercased and sorted.
    pub fn aliases(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Closest authorized alias to a mistyped sub-command.
    fn closest_alias(&self, input: &str, namespace: &Namespace) -> Option<String> {
        let input = input.to_lowercase();
        let mut best: Option<(&str, usize)> = None;
        for (alias, mapping) in &self.commands {
            if !mapping.callable().test_permission(namespace) {
                continue;
            }
            let distance = levenshtein(&input, alias);
            if distance > self.max_distance {
                continue;
            }
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((alias, distance));
            }
        }
        best.map(|(alias, _)| alias.to_string())
    }
}

impl CommandCallable for SimpleDispatcher {
    fn call(
        self: Arc<Self>,
        arguments: &str,
        namespace: &mut Namespace,
        parent_commands: &[String],
    ) -> Result<bool, CommandError> {
        if !self.test_permission(namespace) {
            return Err(CommandError::Authorization);
        }

        let split = split_raw(arguments);
        if self.commands.is_empty() {
            let callable: Arc<dyn CommandCallable> = self.clone();
            return Err(InvalidUsage::new(
                Some(NO_SUB_COMMANDS.to_string()),
                callable,
                parent_commands,
                false,
            )
            .into());
        }

        let sub_command = split[0];
        if let Some(mapping) = self.get(sub_command) {
            let mut path = parent_commands.to_vec();
            path.push(sub_command.to_string());
            let rest = split[1..].join(" ");
            trace!(sub_command, path = ?path, "routing");

            return match Arc::clone(mapping.callable()).call(&rest, namespace, &path) {
                Ok(_) => Ok(true),
                Err(CommandError::Unexpected(err)) => Err(InvocationError::new(err).into()),
                Err(err) => Err(err),
            };
        }

        let suggestion = if self.suggest_similar && !sub_command.is_empty() {
            self.closest_alias(sub_command, namespace)
        } else {
            None
        };
        trace!(sub_command, ?suggestion, "no matching sub-command");
        let callable: Arc<dyn CommandCallable> = self.clone();
        Err(InvalidUsage::new(
            Some(CHOOSE_SUB_COMMAND.to_string()),
            callable,
            parent_commands,
            true,
        )
        .with_suggestion(suggestion)
        .into())
    }

    fn description(&self) -> &Description {
        &self.description
    }

    /// Any child that authorizes grants access; an empty node grants nothing.
    fn test_permission(&self, namespace: &Namespace) -> bool {
        self.commands
            .values()
            .any(|mapping| mapping.callable().test_permission(namespace))
    }

    fn suggestions(
        &self,
        arguments: &str,
        namespace: &Namespace,
    ) -> Result<Vec<String>, CommandError> {
        let split = split_raw(arguments);

        if split.len() <= 1 {
            let prefix = split[0].to_lowercase();
            return Ok(self
                .commands()
                .into_iter()
                .filter(|mapping| {
                    mapping
                        .all_aliases()
                        .iter()
                        .any(|alias| alias.to_lowercase().starts_with(&prefix))
                })
                .filter(|mapping| mapping.callable().test_permission(namespace))
                .map(|mapping| mapping.primary_alias().to_string())
                .collect());
        }

        match self.get(split[0]) {
            Some(mapping) => mapping
                .callable()
                .suggestions(&split[1..].join(" "), namespace),
            None => Ok(Vec::new()),
        }
    }

    fn as_dispatcher(&self) -> Option<&SimpleDispatcher> {
        Some(self)
    }
}

impl fmt::Debug for SimpleDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleDispatcher")
            .field("commands", &self.commands())
            .finish()
    }
}
