//! Provider trait and its type-erased form.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::binding::key::TypeDescriptor;
use crate::error::ProvideError;
use crate::namespace::Namespace;
use crate::stream::ArgumentStream;
use crate::tag::Tag;

/// Turns stream tokens into a typed value.
///
/// Providers must be safe to share across concurrent invocations; any
/// per-call state belongs in the stream's namespace.
pub trait Provider: Send + Sync + 'static {
    type Output: Any + Send;

    /// `true` if the provider reads nothing from the stream (constants,
    /// namespace values, the stream itself). Such parameters are hidden from
    /// usage and completion.
    fn is_self_provided(&self) -> bool {
        false
    }

    fn get(
        &self,
        stream: &mut dyn ArgumentStream,
        tags: &[Tag],
    ) -> Result<Self::Output, ProvideError>;

    fn suggest(&self, _prefix: &str, _namespace: &Namespace, _tags: &[Tag]) -> Vec<String> {
        Vec::new()
    }
}

/// Type-erased provider as stored in the registry.
pub trait ErasedProvider: Send + Sync {
    fn is_self_provided(&self) -> bool;

    fn get(
        &self,
        stream: &mut dyn ArgumentStream,
        tags: &[Tag],
    ) -> Result<Box<dyn Any + Send>, ProvideError>;

    fn suggest(&self, prefix: &str, namespace: &Namespace, tags: &[Tag]) -> Vec<String>;

    fn output_type(&self) -> TypeDescriptor;
}

struct Erased<P>(P);

impl<P: Provider> ErasedProvider for Erased<P> {
    fn is_self_provided(&self) -> bool {
        self.0.is_self_provided()
    }

    fn get(
        &self,
        stream: &mut dyn ArgumentStream,
        tags: &[Tag],
    ) -> Result<Box<dyn Any + Send>, ProvideError> {
        let value = self.0.get(stream, tags)?;
        Ok(Box::new(value))
    }

    fn suggest(&self, prefix: &str, namespace: &Namespace, tags: &[Tag]) -> Vec<String> {
        self.0.suggest(prefix, namespace, tags)
    }

    fn output_type(&self) -> TypeDescriptor {
        TypeDescriptor::of::<P::Output>()
    }
}

pub fn erase<P: Provider>(provider: P) -> Arc<dyn ErasedProvider> {
    Arc::new(Erased(provider))
}

/// Adapts a closure into a [`Provider`].
pub struct FnProvider<T, F> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> FnProvider<T, F>
where
    T: Any + Send,
    F: Fn(&mut dyn ArgumentStream, &[Tag]) -> Result<T, ProvideError> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<T, F> Provider for FnProvider<T, F>
where
    T: Any + Send,
    F: Fn(&mut dyn ArgumentStream, &[Tag]) -> Result<T, ProvideError> + Send + Sync + 'static,
{
    type Output = T;

    fn get(&self, stream: &mut dyn ArgumentStream, tags: &[Tag]) -> Result<T, ProvideError> {
        (self.f)(stream, tags)
    }
}
