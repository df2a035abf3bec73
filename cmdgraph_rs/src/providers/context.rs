//! Providers that read the call context instead of consuming tokens.

use std::any::Any;
use std::marker::PhantomData;

use crate::binding::Provider;
use crate::error::{ProvideError, ProvisionError};
use crate::stream::ArgumentStream;
use crate::tag::Tag;
use crate::tokenizer::Flags;

/// Always yields a clone of one value. Backs `BindingBuilder::to_constant`.
pub struct ConstantProvider<T> {
    value: T,
}

impl<T> ConstantProvider<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> Provider for ConstantProvider<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    fn is_self_provided(&self) -> bool {
        true
    }

    fn get(&self, _stream: &mut dyn ArgumentStream, _tags: &[Tag]) -> Result<T, ProvideError> {
        Ok(self.value.clone())
    }
}

/// Snapshot of whatever the stream still held when the handler's parameter
/// was bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArgs {
    pub tokens: Vec<String>,
    pub flags: Flags,
}

/// Hands the remaining tokens and the flags to the handler as [`RawArgs`]
/// and consumes the stream.
pub struct RawArgsProvider;

impl Provider for RawArgsProvider {
    type Output = RawArgs;

    fn is_self_provided(&self) -> bool {
        true
    }

    fn get(&self, stream: &mut dyn ArgumentStream, _tags: &[Tag]) -> Result<RawArgs, ProvideError> {
        let args = RawArgs {
            tokens: stream.remaining(),
            flags: stream.flags().clone(),
        };
        stream.mark_consumed();
        Ok(args)
    }
}

/// Clones a `T` stored in the invocation namespace.
pub struct NamespaceProvider<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> NamespaceProvider<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for NamespaceProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Provider for NamespaceProvider<T>
where
    T: Any + Clone + Send + Sync,
{
    type Output = T;

    fn is_self_provided(&self) -> bool {
        true
    }

    fn get(&self, stream: &mut dyn ArgumentStream, _tags: &[Tag]) -> Result<T, ProvideError> {
        stream.namespace().get::<T>().cloned().ok_or_else(|| {
            ProvisionError::new(format!(
                "No {} value in the namespace",
                std::any::type_name::<T>()
            ))
            .into()
        })
    }
}
