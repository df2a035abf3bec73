//! Parametric leaves: declarative `CommandSpec`s built into callables that
//! tokenize, bind and invoke a host handler.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::auth::{AllowAll, Authorizer};
use crate::binding::BindingRegistry;
use crate::command::converter::ErrorConverters;
use crate::command::listener::{InvokeError, InvokeHandler, InvokeListener};
use crate::command::CommandCallable;
use crate::config::CmdgraphConfig;
use crate::description::Description;
use crate::dispatcher::SimpleDispatcher;
use crate::error::{
    ArgumentError, CommandError, InvalidUsage, InvocationError, ParametricError, ParseError,
    RegistrationError,
};
use crate::namespace::Namespace;
use crate::parser::{ArgumentParser, BoundArgs, ParameterSpec};
use crate::stream::ContextStream;
use crate::tokenizer::CommandLine;

type Handler = Box<dyn Fn(BoundArgs, &mut Namespace) -> anyhow::Result<()> + Send + Sync>;

/// Declaration of one leaf command, as a host adapter would produce it.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub aliases: Vec<String>,
    pub parameters: Vec<ParameterSpec>,
    pub short_description: Option<String>,
    pub help: Option<String>,
    pub usage: Option<String>,
    /// Any one of these grants access. Empty = everyone.
    pub permissions: Vec<String>,
    /// Accept flags no parameter claims.
    pub any_flags: bool,
    /// Flags tolerated even though no parameter claims them.
    pub allowed_flags: HashSet<char>,
    /// Legacy token-count bounds, checked by [`ArityListener`](super::ArityListener).
    pub min: usize,
    pub max: Option<usize>,
}

impl CommandSpec {
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn param(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn desc(mut self, text: impl Into<String>) -> Self {
        self.short_description = Some(text.into());
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn require(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn any_flags(mut self) -> Self {
        self.any_flags = true;
        self
    }

    pub fn allow_flags(mut self, flags: &str) -> Self {
        self.allowed_flags.extend(flags.chars());
        self
    }

    pub fn arity(mut self, min: usize, max: Option<usize>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn primary_alias(&self) -> &str {
        self.aliases.first().map(String::as_str).unwrap_or("_")
    }
}

/// Builds [`ParametricCommand`]s that share one registry, authorizer,
/// listener set and converter set.
pub struct ParametricBuilder {
    registry: Arc<BindingRegistry>,
    authorizer: Arc<dyn Authorizer>,
    listeners: Vec<Arc<dyn InvokeListener>>,
    converters: ErrorConverters,
    help_flag: char,
    ignore_unused_flags: bool,
    allow_hanging_flags: bool,
}

impl ParametricBuilder {
    pub fn new(registry: Arc<BindingRegistry>) -> Self {
        let defaults = CmdgraphConfig::default();
        Self {
            registry,
            authorizer: Arc::new(AllowAll),
            listeners: Vec::new(),
            converters: ErrorConverters::new(),
            help_flag: defaults.parsing.help_flag,
            ignore_unused_flags: defaults.parsing.ignore_unused_flags,
            allow_hanging_flags: defaults.completion.allow_hanging_flags,
        }
    }

    pub fn with_config(mut self, config: &CmdgraphConfig) -> Self {
        self.help_flag = config.parsing.help_flag;
        self.ignore_unused_flags = config.parsing.ignore_unused_flags;
        self.allow_hanging_flags = config.completion.allow_hanging_flags;
        self
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    pub fn set_authorizer(&mut self, authorizer: impl Authorizer + 'static) {
        self.authorizer = Arc::new(authorizer);
    }

    pub fn add_invoke_listener(&mut self, listener: impl InvokeListener + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    pub fn add_error_converter<E, F>(&mut self, convert: F) -> Result<(), RegistrationError>
    where
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(&E) -> Option<CommandError> + Send + Sync + 'static,
    {
        self.converters.register(convert)
    }

    pub fn build<F>(&self, spec: CommandSpec, handler: F) -> Result<Arc<ParametricCommand>, ParametricError>
    where
        F: Fn(BoundArgs, &mut Namespace) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut parser_builder =
            ArgumentParser::builder(&self.registry).allow_hanging_flags(self.allow_hanging_flags);
        for parameter in &spec.parameters {
            parser_builder.add_parameter(parameter.clone())?;
        }
        let parser = parser_builder.build();

        let mut description = Description::builder()
            .parameters(parser.user_parameters())
            .short_description(spec.short_description.clone())
            .help(spec.help.clone())
            .usage_override(spec.usage.clone())
            .permissions(spec.permissions.clone());
        for listener in &self.listeners {
            listener.update_description(&spec, &parser, &mut description);
        }

        debug!(command = spec.primary_alias(), parameters = spec.parameters.len(), "command built");
        Ok(Arc::new(ParametricCommand {
            ignore_unused_flags: spec.any_flags || self.ignore_unused_flags,
            spec,
            parser,
            description: description.build(),
            handler: Box::new(handler),
            authorizer: Arc::clone(&self.authorizer),
            listeners: self.listeners.clone(),
            converters: self.converters.clone(),
            help_flag: self.help_flag,
        }))
    }

    /// Build and register under the command's aliases.
    pub fn register<F>(
        &self,
        dispatcher: &mut SimpleDispatcher,
        spec: CommandSpec,
        handler: F,
    ) -> Result<Arc<ParametricCommand>, ParametricError>
    where
        F: Fn(BoundArgs, &mut Namespace) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let aliases = spec.aliases.clone();
        let command = self.build(spec, handler)?;
        dispatcher.register_command(command.clone(), &aliases)?;
        Ok(command)
    }
}

/// A leaf command: parses its arguments and hands them to a host handler.
pub struct ParametricCommand {
    spec: CommandSpec,
    parser: ArgumentParser,
    description: Description,
    handler: Handler,
    authorizer: Arc<dyn Authorizer>,
    listeners: Vec<Arc<dyn InvokeListener>>,
    converters: ErrorConverters,
    help_flag: char,
    ignore_unused_flags: bool,
}

enum CallFailure {
    Argument(ArgumentError),
    Command(CommandError),
    /// Provision errors and broken defaults: the registration is wrong.
    Internal(String, anyhow::Error),
    Handler(anyhow::Error),
}

impl From<InvokeError> for CallFailure {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::Argument(e) => CallFailure::Argument(e),
            InvokeError::Command(e) => CallFailure::Command(e),
        }
    }
}

impl From<ParseError> for CallFailure {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Argument(e) => CallFailure::Argument(e),
            ParseError::Provision(e) => CallFailure::Internal(e.message.clone(), e.into()),
            ParseError::IllegalParameter(message) => {
                CallFailure::Internal(message.clone(), anyhow::anyhow!(message))
            }
        }
    }
}

impl ParametricCommand {
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn parser(&self) -> &ArgumentParser {
        &self.parser
    }

    fn run(
        &self,
        line: &CommandLine,
        handlers: &mut [Box<dyn InvokeHandler>],
        namespace: &mut Namespace,
    ) -> Result<(), CallFailure> {
        let mut invoke = true;
        for handler in handlers.iter_mut() {
            if !handler.pre_process(&self.spec, &self.parser, line)? {
                invoke = false;
            }
        }
        if !invoke {
            return Ok(());
        }

        let args = {
            let mut stream = ContextStream::new(line.clone(), namespace);
            self.parser
                .parse_arguments(&mut stream, self.ignore_unused_flags, &self.spec.allowed_flags)?
        };

        for handler in handlers.iter_mut() {
            if !handler.pre_invoke(&self.spec, &self.parser, &args, line)? {
                invoke = false;
            }
        }
        if !invoke {
            return Ok(());
        }

        trace!(command = self.spec.primary_alias(), "invoking handler");
        (self.handler)(args, namespace).map_err(CallFailure::Handler)?;

        for handler in handlers.iter_mut() {
            handler.post_invoke(&self.spec, &self.parser, line)?;
        }
        Ok(())
    }

    fn translate(self: &Arc<Self>, failure: CallFailure, parents: &[String]) -> CommandError {
        match failure {
            CallFailure::Argument(err) => self.invalid_usage(err, parents),
            CallFailure::Command(err) => err,
            CallFailure::Internal(message, source) => {
                debug!(command = self.spec.primary_alias(), %message, "binding failed");
                InvocationError::with_message(format!("Internal error occurred: {message}"), source)
                    .into()
            }
            CallFailure::Handler(err) => {
                let err = match err.downcast::<CommandError>() {
                    Ok(command_error) => return command_error,
                    Err(err) => err,
                };
                let err = match err.downcast::<ArgumentError>() {
                    Ok(argument_error) => return self.invalid_usage(argument_error, parents),
                    Err(err) => err,
                };
                if let Some(converted) = self.converters.convert(&err) {
                    return converted;
                }
                debug!(command = self.spec.primary_alias(), error = %err, "handler failed");
                InvocationError::new(err).into()
            }
        }
    }

    fn invalid_usage(self: &Arc<Self>, err: ArgumentError, parents: &[String]) -> CommandError {
        let message = match &err {
            ArgumentError::Missing {
                parameter: Some(parameter),
            } => format!(
                "Too few arguments! No value found for parameter '{}'",
                parameter.name
            ),
            ArgumentError::Missing { parameter: None } => "Too few arguments!".to_string(),
            ArgumentError::Unused { unconsumed } => {
                format!("Too many arguments! Unused arguments: {unconsumed}")
            }
            ArgumentError::Parse {
                message,
                parameter: Some(parameter),
            } => format!("For parameter '{}': {message}", parameter.name),
            ArgumentError::Parse {
                message,
                parameter: None,
            } => format!("Error parsing arguments: {message}"),
        };
        let callable: Arc<dyn CommandCallable> = self.clone();
        InvalidUsage::new(Some(message), callable, parents, false)
            .with_cause(err)
            .into()
    }
}

impl CommandCallable for ParametricCommand {
    fn call(
        self: Arc<Self>,
        arguments: &str,
        namespace: &mut Namespace,
        parent_commands: &[String],
    ) -> Result<bool, CommandError> {
        if !self.test_permission(namespace) {
            return Err(CommandError::Authorization);
        }

        let line = self.parser.tokenizer().tokenize(arguments)?;
        if line.has_flag(self.help_flag) {
            let callable: Arc<dyn CommandCallable> = self.clone();
            return Err(InvalidUsage::new(None, callable, parent_commands, true).into());
        }

        let mut handlers: Vec<Box<dyn InvokeHandler>> =
            self.listeners.iter().map(|l| l.create_handler()).collect();

        match self.run(&line, &mut handlers, namespace) {
            Ok(()) => Ok(true),
            Err(failure) => Err(self.translate(failure, parent_commands)),
        }
    }

    fn description(&self) -> &Description {
        &self.description
    }

    fn test_permission(&self, namespace: &Namespace) -> bool {
        self.spec.permissions.is_empty()
            || self
                .spec
                .permissions
                .iter()
                .any(|p| self.authorizer.test_permission(namespace, p))
    }

    fn suggestions(&self, arguments: &str, namespace: &Namespace) -> Result<Vec<String>, CommandError> {
        Ok(self.parser.parse_suggestions(arguments, namespace))
    }
}
