//! Error taxonomy for parsing, binding and dispatch.
//!
//! The layers mirror where a failure is detected:
//!
//! - [`ArgumentError`] - bad or missing user input, local to parsing
//! - [`ProvisionError`] - a provider could not be configured or satisfied
//! - [`ParametricError`] - a command could not be built (bad registration)
//! - [`RegistrationError`] - alias collisions and duplicate converters
//! - [`CommandError`] - the only error that crosses a `call` boundary
//!
//! Argument and provision errors never leave a single command's `call`; they
//! are translated into [`InvalidUsage`] or [`InvocationError`] first.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::command::CommandCallable;
use crate::description::Parameter;

/// A problem with what the user typed.
#[derive(Debug, Clone, Error)]
pub enum ArgumentError {
    /// The stream ran out of tokens.
    #[error("{}", missing_message(.parameter.as_ref()))]
    Missing { parameter: Option<Parameter> },

    /// A token had the wrong format or failed a validation modifier.
    #[error("{message}")]
    Parse {
        message: String,
        parameter: Option<Parameter>,
    },

    /// Tokens or flags were left over after every parameter was bound.
    #[error("unused arguments: {unconsumed}")]
    Unused { unconsumed: String },
}

fn missing_message(parameter: Option<&Parameter>) -> String {
    match parameter {
        Some(p) => format!("missing argument for parameter '{}'", p.name),
        None => "missing argument".to_string(),
    }
}

impl ArgumentError {
    pub fn missing() -> Self {
        ArgumentError::Missing { parameter: None }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        ArgumentError::Parse {
            message: message.into(),
            parameter: None,
        }
    }

    /// Attach the parameter being bound, keeping the original message.
    pub fn for_parameter(self, parameter: &Parameter) -> Self {
        match self {
            ArgumentError::Missing { .. } => ArgumentError::Missing {
                parameter: Some(parameter.clone()),
            },
            ArgumentError::Parse { message, .. } => ArgumentError::Parse {
                message,
                parameter: Some(parameter.clone()),
            },
            other => other,
        }
    }

    pub fn parameter(&self) -> Option<&Parameter> {
        match self {
            ArgumentError::Missing { parameter } | ArgumentError::Parse { parameter, .. } => {
                parameter.as_ref()
            }
            ArgumentError::Unused { .. } => None,
        }
    }
}

/// Configuration or internal failure while providing a value.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProvisionError {
    pub message: String,
}

impl ProvisionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result error of [`Provider::get`](crate::binding::Provider::get).
#[derive(Debug, Clone, Error)]
pub enum ProvideError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
}

/// Result error of [`ArgumentParser::parse_arguments`](crate::parser::ArgumentParser::parse_arguments).
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    /// A registered default value does not parse against its own provider.
    #[error("{0}")]
    IllegalParameter(String),
}

impl From<ProvideError> for ParseError {
    fn from(err: ProvideError) -> Self {
        match err {
            ProvideError::Argument(e) => ParseError::Argument(e),
            ProvideError::Provision(e) => ParseError::Provision(e),
        }
    }
}

/// Build-time failure while turning a command declaration into a callable.
#[derive(Debug, Clone, Error)]
pub enum ParametricError {
    #[error("illegal parameter: {0}")]
    IllegalParameter(String),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Failure while registering commands or converters.
#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    #[error("Can't add the command '{0}' because the dispatcher does not support replacing commands")]
    AliasTaken(String),
    #[error("a command needs at least one alias")]
    NoAliases,
    #[error("an error converter for '{0}' is already registered")]
    DuplicateConverter(&'static str),
    #[error("no open group to close")]
    NoParent,
}

/// A command was used incorrectly.
///
/// Carries the callable that rejected the input and the alias path that led
/// to it, so a frontend can print the right usage line.
#[derive(Clone, Error)]
#[error("{}", .message.as_deref().unwrap_or("The command was used incorrectly."))]
pub struct InvalidUsage {
    pub message: Option<String>,
    pub command: Arc<dyn CommandCallable>,
    pub alias_stack: Vec<String>,
    pub full_help_suggested: bool,
    /// Closest known alias when the input looked like a typo.
    pub suggestion: Option<String>,
    pub cause: Option<ArgumentError>,
}

impl InvalidUsage {
    pub fn new(
        message: Option<String>,
        command: Arc<dyn CommandCallable>,
        alias_stack: &[String],
        full_help_suggested: bool,
    ) -> Self {
        Self {
            message,
            command,
            alias_stack: alias_stack.to_vec(),
            full_help_suggested,
            suggestion: None,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: ArgumentError) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }
}

impl fmt::Debug for InvalidUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidUsage")
            .field("message", &self.message)
            .field("usage", &self.command.description().usage())
            .field("alias_stack", &self.alias_stack)
            .field("full_help_suggested", &self.full_help_suggested)
            .field("suggestion", &self.suggestion)
            .finish()
    }
}

/// Wraps a failure raised while executing a command.
///
/// The underlying cause is always present.
#[derive(Debug, Error)]
#[error("{}", invocation_message(.message.as_deref(), .source))]
pub struct InvocationError {
    pub message: Option<String>,
    #[source]
    pub source: anyhow::Error,
}

fn invocation_message(message: Option<&str>, source: &anyhow::Error) -> String {
    match message {
        Some(m) => m.to_string(),
        None => source.to_string(),
    }
}

impl InvocationError {
    pub fn new(source: impl Into<anyhow::Error>) -> Self {
        Self {
            message: None,
            source: source.into(),
        }
    }

    pub fn with_message(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            message: Some(message.into()),
            source: source.into(),
        }
    }
}

/// Everything a [`CommandCallable::call`] may fail with.
#[derive(Debug, Error)]
pub enum CommandError {
    /// General command-level failure, e.g. raised by a handler or the tokenizer.
    #[error("{0}")]
    Command(String),

    #[error(transparent)]
    InvalidUsage(Box<InvalidUsage>),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("You are not permitted to use this command")]
    Authorization,

    /// An error of unknown kind from a host-implemented callable.
    /// Dispatchers wrap it once into [`CommandError::Invocation`].
    #[error(transparent)]
    Unexpected(anyhow::Error),
}

impl CommandError {
    pub fn command(message: impl Into<String>) -> Self {
        CommandError::Command(message.into())
    }

    pub fn as_invalid_usage(&self) -> Option<&InvalidUsage> {
        match self {
            CommandError::InvalidUsage(usage) => Some(usage),
            _ => None,
        }
    }
}

impl From<InvalidUsage> for CommandError {
    fn from(usage: InvalidUsage) -> Self {
        CommandError::InvalidUsage(Box::new(usage))
    }
}
