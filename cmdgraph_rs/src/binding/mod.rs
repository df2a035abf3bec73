//! Type-directed provider registry.
//!
//! A [`Key`] names a type plus an optional classifier; a [`Binding`] pairs a
//! key with a [`Provider`]. The parser resolves each parameter slot to one
//! binding when a command is built.

pub mod key;
pub mod provider;
pub mod registry;

pub use key::{Key, TypeDescriptor};
pub use provider::{ErasedProvider, FnProvider, Provider, erase};
pub use registry::{Binding, BindingBuilder, BindingModule, BindingRegistry};
