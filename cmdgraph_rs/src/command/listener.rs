//! Invoke listeners that run around a leaf's handler.

use thiserror::Error;

use crate::command::CommandSpec;
use crate::description::DescriptionBuilder;
use crate::error::{ArgumentError, CommandError};
use crate::parser::{ArgumentParser, BoundArgs};
use crate::tokenizer::CommandLine;

/// What an invoke hook may fail with. Argument errors become usage errors,
/// command errors pass through unchanged.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Per-call hooks around argument binding and the handler.
///
/// Returning `Ok(false)` from a `pre_*` hook skips the handler; the call
/// still reports success.
pub trait InvokeHandler: Send {
    fn pre_process(
        &mut self,
        _spec: &CommandSpec,
        _parser: &ArgumentParser,
        _line: &CommandLine,
    ) -> Result<bool, InvokeError> {
        Ok(true)
    }

    fn pre_invoke(
        &mut self,
        _spec: &CommandSpec,
        _parser: &ArgumentParser,
        _args: &BoundArgs,
        _line: &CommandLine,
    ) -> Result<bool, InvokeError> {
        Ok(true)
    }

    fn post_invoke(
        &mut self,
        _spec: &CommandSpec,
        _parser: &ArgumentParser,
        _line: &CommandLine,
    ) -> Result<(), InvokeError> {
        Ok(())
    }
}

/// Installed on a builder; sees every command it builds.
pub trait InvokeListener: Send + Sync {
    /// Fresh hook state for one call.
    fn create_handler(&self) -> Box<dyn InvokeHandler>;

    fn update_description(
        &self,
        _spec: &CommandSpec,
        _parser: &ArgumentParser,
        _description: &mut DescriptionBuilder,
    ) {
    }
}

/// Enforces `CommandSpec::arity` token counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArityListener;

pub const UNKNOWN_USAGE: &str = "(unknown usage information)";

impl InvokeListener for ArityListener {
    fn create_handler(&self) -> Box<dyn InvokeHandler> {
        Box::new(ArityHandler)
    }

    fn update_description(
        &self,
        spec: &CommandSpec,
        parser: &ArgumentParser,
        description: &mut DescriptionBuilder,
    ) {
        // Without this, a command that only takes raw tokens would show an
        // empty usage line.
        let declares_arity = spec.min > 0 || spec.max.is_some_and(|max| max > 0);
        if spec.usage.is_none() && declares_arity && !parser.user_parameters().is_empty() {
            description.set_usage_override(UNKNOWN_USAGE);
        }
    }
}

struct ArityHandler;

impl InvokeHandler for ArityHandler {
    fn pre_process(
        &mut self,
        spec: &CommandSpec,
        _parser: &ArgumentParser,
        line: &CommandLine,
    ) -> Result<bool, InvokeError> {
        if line.len() < spec.min {
            return Err(ArgumentError::missing().into());
        }
        if let Some(max) = spec.max.filter(|max| line.len() > *max) {
            return Err(ArgumentError::Unused {
                unconsumed: line.positional()[max..].join(" "),
            }
            .into());
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingRegistry;
    use crate::parser::ParameterSpec;
    use crate::providers::{PrimitivesModule, RawArgs};

    fn raw_parser(registry: &BindingRegistry) -> ArgumentParser {
        let mut builder = ArgumentParser::builder(registry);
        builder
            .add_parameter(ParameterSpec::of::<RawArgs>())
            .expect("raw args");
        builder.build()
    }

    #[test]
    fn test_arity_bounds() {
        let mut registry = BindingRegistry::new();
        registry.install(&PrimitivesModule);
        let parser = raw_parser(&registry);
        let spec = CommandSpec::new(["legacy"]).arity(1, Some(2));
        let mut handler = ArityListener.create_handler();

        let line = CommandLine::parse("").expect("tokenize");
        assert!(matches!(
            handler.pre_process(&spec, &parser, &line),
            Err(InvokeError::Argument(ArgumentError::Missing { .. }))
        ));

        let line = CommandLine::parse("a b").expect("tokenize");
        assert!(handler.pre_process(&spec, &parser, &line).expect("in bounds"));

        let line = CommandLine::parse("a b c d").expect("tokenize");
        match handler.pre_process(&spec, &parser, &line) {
            Err(InvokeError::Argument(ArgumentError::Unused { unconsumed })) => {
                assert_eq!(unconsumed, "c d")
            }
            other => panic!("expected unused arguments, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_usage_only_with_user_parameters() {
        let mut registry = BindingRegistry::new();
        registry.install(&PrimitivesModule);
        let spec = CommandSpec::new(["legacy"]).arity(1, None);

        // RawArgs is self-provided: no user parameters, usage untouched.
        let parser = raw_parser(&registry);
        let mut description = DescriptionBuilder::default();
        ArityListener.update_description(&spec, &parser, &mut description);
        assert_eq!(description.current().usage_override, None);

        let mut builder = ArgumentParser::builder(&registry);
        builder
            .add_parameter(ParameterSpec::of::<String>())
            .expect("string");
        let parser = builder.build();
        let mut description = DescriptionBuilder::default();
        ArityListener.update_description(&spec, &parser, &mut description);
        assert_eq!(description.build().usage(), UNKNOWN_USAGE);
    }
}
