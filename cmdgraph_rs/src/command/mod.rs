//! Callables: leaf commands and the contract they share with dispatchers.

pub mod converter;
pub mod listener;
pub mod parametric;

use std::fmt;
use std::sync::Arc;

pub use converter::ErrorConverters;
pub use listener::{ArityListener, InvokeError, InvokeHandler, InvokeListener, UNKNOWN_USAGE};
pub use parametric::{CommandSpec, ParametricBuilder, ParametricCommand};

use crate::description::Description;
use crate::dispatcher::SimpleDispatcher;
use crate::error::CommandError;
use crate::namespace::Namespace;

/// Anything that can sit in a dispatcher table: a leaf command or another
/// dispatcher.
///
/// `call` takes `Arc<Self>` so a failing callable can hand itself to the
/// [`InvalidUsage`](crate::error::InvalidUsage) it returns.
pub trait CommandCallable: Send + Sync {
    /// Run with the text after this command's alias. `parent_commands` is
    /// the alias path that led here, this command's alias included.
    fn call(
        self: Arc<Self>,
        arguments: &str,
        namespace: &mut Namespace,
        parent_commands: &[String],
    ) -> Result<bool, CommandError>;

    fn description(&self) -> &Description;

    fn test_permission(&self, namespace: &Namespace) -> bool;

    fn suggestions(&self, arguments: &str, namespace: &Namespace)
    -> Result<Vec<String>, CommandError>;

    /// `Some` for dispatcher nodes, used when rendering sub-command lists.
    fn as_dispatcher(&self) -> Option<&SimpleDispatcher> {
        None
    }
}

/// A callable together with the aliases it is registered under.
#[derive(Clone)]
pub struct CommandMapping {
    aliases: Vec<String>,
    callable: Arc<dyn CommandCallable>,
}

impl CommandMapping {
    /// `aliases` must be non-empty; the first one is the primary alias.
    pub(crate) fn new(callable: Arc<dyn CommandCallable>, aliases: Vec<String>) -> Self {
        Self { aliases, callable }
    }

    pub fn primary_alias(&self) -> &str {
        self.aliases.first().map(String::as_str).unwrap_or_default()
    }

    pub fn all_aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn callable(&self) -> &Arc<dyn CommandCallable> {
        &self.callable
    }

    pub fn description(&self) -> &Description {
        self.callable.description()
    }
}

impl fmt::Debug for CommandMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandMapping")
            .field("aliases", &self.aliases)
            .field("usage", &self.description().usage())
            .finish()
    }
}
