//! Fluent construction of a dispatcher tree.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use cmdgraph::{BindingRegistry, CommandGraph, CommandSpec, ParametricBuilder, PrimitivesModule};
//! # fn main() -> anyhow::Result<()> {
//! let mut registry = BindingRegistry::new();
//! registry.install(&PrimitivesModule);
//! let mut graph = CommandGraph::new(ParametricBuilder::new(Arc::new(registry)));
//! graph.register(CommandSpec::new(["ping"]), |_, _| Ok(()))?;
//! graph.group(["admin"])?;
//! graph.register(CommandSpec::new(["ban"]), |_, _| Ok(()))?;
//! graph.parent()?;
//! let root = graph.build()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::command::{CommandSpec, ParametricBuilder, ParametricCommand};
use crate::config::CmdgraphConfig;
use crate::dispatcher::SimpleDispatcher;
use crate::error::{ParametricError, RegistrationError};
use crate::namespace::Namespace;
use crate::parser::BoundArgs;

/// A group that has been opened but not yet attached to its parent.
struct OpenGroup {
    aliases: Vec<String>,
    node: SimpleDispatcher,
}

pub struct CommandGraph {
    builder: ParametricBuilder,
    config: CmdgraphConfig,
    root: SimpleDispatcher,
    open: Vec<OpenGroup>,
}

impl CommandGraph {
    pub fn new(builder: ParametricBuilder) -> Self {
        Self::with_config(builder, &CmdgraphConfig::default())
    }

    pub fn with_config(builder: ParametricBuilder, config: &CmdgraphConfig) -> Self {
        Self {
            builder,
            config: config.clone(),
            root: SimpleDispatcher::new().with_config(config),
            open: Vec::new(),
        }
    }

    pub fn builder(&self) -> &ParametricBuilder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut ParametricBuilder {
        &mut self.builder
    }

    /// Nesting depth: 0 at the root.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn current(&self) -> &SimpleDispatcher {
        self.open.last().map(|group| &group.node).unwrap_or(&self.root)
    }

    /// Build a leaf command and register it in the current group.
    pub fn register<F>(
        &mut self,
        spec: CommandSpec,
        handler: F,
    ) -> Result<Arc<ParametricCommand>, ParametricError>
    where
        F: Fn(BoundArgs, &mut Namespace) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let node = match self.open.last_mut() {
            Some(group) => &mut group.node,
            None => &mut self.root,
        };
        self.builder.register(node, spec, handler)
    }

    /// Short description shown for the current group in listings.
    pub fn describe(&mut self, text: impl Into<String>) -> &mut Self {
        match self.open.last_mut() {
            Some(group) => group.node.set_short_description(text),
            None => self.root.set_short_description(text),
        }
        self
    }

    /// Open a child dispatcher; following registrations land in it until
    /// [`parent`](Self::parent).
    pub fn group<I>(&mut self, aliases: I) -> Result<&mut Self, RegistrationError>
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
        if let Some(taken) = aliases.iter().find(|alias| self.current().contains(alias)) {
            return Err(RegistrationError::AliasTaken(taken.clone()));
        }

        debug!(aliases = ?aliases, depth = self.open.len() + 1, "group opened");
        self.open.push(OpenGroup {
            aliases,
            node: SimpleDispatcher::new().with_config(&self.config),
        });
        Ok(self)
    }

    /// Attach the innermost open group to its parent and step out of it.
    pub fn parent(&mut self) -> Result<&mut Self, RegistrationError> {
        let group = self.open.pop().ok_or(RegistrationError::NoParent)?;
        let parent = match self.open.last_mut() {
            Some(outer) => &mut outer.node,
            None => &mut self.root,
        };
        parent.register_command(Arc::new(group.node), &group.aliases)?;
        debug!(aliases = ?group.aliases, "group closed");
        Ok(self)
    }

    /// Close any open groups and return the root.
    pub fn build(mut self) -> Result<Arc<SimpleDispatcher>, RegistrationError> {
        while !self.open.is_empty() {
            self.parent()?;
        }
        Ok(Arc::new(self.root))
    }
}
