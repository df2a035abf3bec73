//! # cmdgraph
//!
//! **Embeddable command interpreter core** for chat bots, game servers, REPLs
//! and admin consoles.
//!
//! A host registers typed commands once at startup, then feeds raw lines such
//! as `admin ban alex -t 60 being rude` through a tree of dispatchers. Each
//! line is tokenized, routed on its leading words and bound to typed values
//! before the host's handler sees it.
//!
//! ## Features
//!
//! - **Tokenizer** - quoting, flag groups, value flags and the `--` terminator
//! - **Typed binding** - a registry of providers keyed by type and classifier
//! - **Defaults and validation** - optional slots, ranges, regex checks
//! - **Nested dispatch** - case-insensitive aliases, permission aggregation
//! - **Completion** - suggestions that descend the same tree as calls
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cmdgraph::{
//!     BindingRegistry, CommandCallable, CommandGraph, CommandSpec, Namespace, ParameterSpec,
//!     ParametricBuilder, PrimitivesModule,
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut registry = BindingRegistry::new();
//! registry.install(&PrimitivesModule);
//!
//! let mut graph = CommandGraph::new(ParametricBuilder::new(Arc::new(registry)));
//! graph.register(
//!     CommandSpec::new(["add"])
//!         .param(ParameterSpec::of::<i64>().named("a"))
//!         .param(ParameterSpec::of::<i64>().named("b")),
//!     |mut args, _ns| {
//!         println!("{}", args.require::<i64>(0)? + args.require::<i64>(1)?);
//!         Ok(())
//!     },
//! )?;
//! let root = graph.build()?;
//!
//! let mut ns = Namespace::new();
//! root.call("add 2 0x10", &mut ns, &[])?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Input
// ============================================================================

/// Raw text to positional tokens plus flags.
pub mod tokenizer;

/// Sequential cursor over tokens, consumed while binding.
pub mod stream;

/// Parameter slot classification and stream projection.
pub mod option_type;

/// Parameter modifiers: classifiers, defaults, switches, ranges, patterns.
pub mod tag;

// ============================================================================
// Binding
// ============================================================================

/// Type- and classifier-keyed provider registry.
///
/// # Key Types
///
/// - [`BindingRegistry`](binding::BindingRegistry) - the registry itself
/// - [`Provider`](binding::Provider) - produces one value from a stream
/// - [`Key`](binding::Key) - type plus optional classifier
pub mod binding;

/// Built-in providers and [`PrimitivesModule`](providers::PrimitivesModule).
pub mod providers;

/// Binds an ordered parameter list against a stream.
pub mod parser;

// ============================================================================
// Commands and dispatch
// ============================================================================

/// Permission checks.
pub mod auth;

/// Leaf commands, invoke listeners and error converters.
pub mod command;

/// Optional `.cmdgraph/config.toml` settings.
pub mod config;

/// Parameter lists, help text and usage lines.
pub mod description;

/// Alias tables and the command tree.
pub mod dispatcher;

/// Error taxonomy.
pub mod error;

/// Per-invocation context values.
pub mod namespace;

/// Usage report rendering.
pub mod usage;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use auth::{AllowAll, Authorizer, Subject, SubjectAuthorizer};
pub use binding::{BindingModule, BindingRegistry, Key, Provider};
pub use command::{
    ArityListener, CommandCallable, CommandMapping, CommandSpec, ErrorConverters, InvokeListener,
    ParametricBuilder, ParametricCommand,
};
pub use config::CmdgraphConfig;
pub use description::{Description, Parameter};
pub use dispatcher::{CommandGraph, SimpleDispatcher};
pub use error::{
    ArgumentError, CommandError, InvalidUsage, InvocationError, ParametricError, ProvisionError,
    RegistrationError,
};
pub use namespace::Namespace;
pub use option_type::OptionType;
pub use parser::{ArgumentParser, BoundArgs, ParameterSpec};
pub use providers::{EnumProvider, PrimitivesModule, RawArgs, TEXT};
pub use stream::ArgumentStream;
pub use tag::Tag;
pub use tokenizer::{CommandLine, Tokenizer};
pub use usage::render_invalid_usage;
