//! The binding registry mapping keys to providers.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::binding::key::Key;
use crate::binding::provider::{ErasedProvider, Provider, erase};
use crate::error::{ProvideError, ProvisionError};
use crate::namespace::Namespace;
use crate::providers::ConstantProvider;
use crate::stream::ArgumentStream;
use crate::tag::Tag;

/// A registered (key, provider) pair.
#[derive(Clone)]
pub struct Binding {
    key: Key,
    provider: Arc<dyn ErasedProvider>,
}

impl Binding {
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn is_self_provided(&self) -> bool {
        self.provider.is_self_provided()
    }

    pub fn get(
        &self,
        stream: &mut dyn ArgumentStream,
        tags: &[Tag],
    ) -> Result<Box<dyn Any + Send>, ProvideError> {
        self.provider.get(stream, tags)
    }

    pub fn suggest(&self, prefix: &str, namespace: &Namespace, tags: &[Tag]) -> Vec<String> {
        self.provider.suggest(prefix, namespace, tags)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("self_provided", &self.is_self_provided())
            .finish()
    }
}

/// A set of bindings installed as one unit.
pub trait BindingModule {
    fn configure(&self, registry: &mut BindingRegistry);
}

/// Type- and classifier-directed provider lookup.
///
/// Populate once at startup, then share behind an `Arc`; lookups take
/// `&self` only. Re-binding an existing key replaces the earlier provider.
#[derive(Default)]
pub struct BindingRegistry {
    bindings: BTreeMap<Key, Binding>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a binding for values of type `T`.
    pub fn bind<T: Any + Send>(&mut self) -> BindingBuilder<'_, T> {
        BindingBuilder {
            registry: self,
            key: Key::of::<T>(),
            _marker: PhantomData,
        }
    }

    /// Register an already erased provider under an explicit key.
    pub fn insert(&mut self, key: Key, provider: Arc<dyn ErasedProvider>) {
        if key.descriptor() != provider.output_type() {
            warn!(
                key = ?key,
                output = %provider.output_type(),
                "provider output type does not match its key"
            );
        }
        let binding = Binding {
            key: key.clone(),
            provider,
        };
        if self.bindings.insert(key.clone(), binding).is_some() {
            warn!(key = ?key, "binding replaced");
        } else {
            debug!(key = ?key, "binding registered");
        }
    }

    /// Exact match on (type, classifier); no fallback to the unclassified key.
    pub fn lookup(&self, key: &Key) -> Option<&Binding> {
        self.bindings.get(key)
    }

    pub fn install(&mut self, module: &dyn BindingModule) {
        module.configure(self);
    }

    /// Resolve `T` through its unclassified binding and read it from `stream`.
    pub fn get_instance<T: Any + Send>(
        &self,
        stream: &mut dyn ArgumentStream,
        tags: &[Tag],
    ) -> Result<T, ProvideError> {
        let key = Key::of::<T>();
        let binding = self
            .lookup(&key)
            .ok_or_else(|| ProvisionError::new(format!("No binding registered for {key:?}")))?;
        let value = binding.get(stream, tags)?;
        value
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| ProvisionError::new(format!("Binding for {key:?} produced another type")).into())
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.bindings.keys()).finish()
    }
}

/// Fluent registration returned by [`BindingRegistry::bind`].
pub struct BindingBuilder<'r, T> {
    registry: &'r mut BindingRegistry,
    key: Key,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send> BindingBuilder<'_, T> {
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.key = self.key.with_classifier(classifier);
        self
    }

    pub fn to_provider<P>(self, provider: P)
    where
        P: Provider<Output = T>,
    {
        self.registry.insert(self.key, erase(provider));
    }

    /// Self-provided binding that always yields a clone of `value`.
    pub fn to_constant(self, value: T)
    where
        T: Clone + Sync,
    {
        self.registry
            .insert(self.key, erase(ConstantProvider::new(value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StringListStream;

    struct Fixed(i32);

    impl Provider for Fixed {
        type Output = i32;

        fn get(&self, _: &mut dyn ArgumentStream, _: &[Tag]) -> Result<i32, ProvideError> {
            Ok(self.0)
        }
    }

    fn fixed(n: i32) -> Fixed {
        Fixed(n)
    }

    fn read(binding: &Binding) -> i32 {
        let mut stream = StringListStream::detached(Vec::<String>::new());
        let value = binding.get(&mut stream, &[]).expect("provide");
        *value.downcast::<i32>().expect("i32")
    }

    #[test]
    fn test_lookup_is_exact_on_classifier() {
        let mut registry = BindingRegistry::new();
        registry.bind::<i32>().to_provider(fixed(1));
        registry
            .bind::<i32>()
            .with_classifier("Ratio")
            .to_provider(fixed(2));

        let base = registry.lookup(&Key::of::<i32>()).expect("base binding");
        assert_eq!(read(base), 1);
        let ratio = registry
            .lookup(&Key::of::<i32>().with_classifier("Ratio"))
            .expect("classified binding");
        assert_eq!(read(ratio), 2);
        assert!(
            registry
                .lookup(&Key::of::<i32>().with_classifier("Other"))
                .is_none()
        );
    }

    #[test]
    fn test_rebinding_replaces() {
        let mut registry = BindingRegistry::new();
        registry.bind::<i32>().to_provider(fixed(1));
        registry.bind::<i32>().to_provider(fixed(3));
        assert_eq!(registry.len(), 1);
        assert_eq!(read(registry.lookup(&Key::of::<i32>()).expect("binding")), 3);
    }

    #[test]
    fn test_constant_binding_is_self_provided() {
        let mut registry = BindingRegistry::new();
        registry
            .bind::<String>()
            .with_classifier("motd")
            .to_constant("hello".to_string());
        let binding = registry
            .lookup(&Key::of::<String>().with_classifier("motd"))
            .expect("binding");
        assert!(binding.is_self_provided());
    }

    #[test]
    fn test_get_instance() {
        struct Module;
        impl BindingModule for Module {
            fn configure(&self, registry: &mut BindingRegistry) {
                registry.bind::<u8>().to_constant(4);
            }
        }

        let mut registry = BindingRegistry::new();
        registry.install(&Module);
        let mut stream = StringListStream::detached(Vec::<String>::new());
        assert_eq!(registry.get_instance::<u8>(&mut stream, &[]).expect("u8"), 4);
        assert!(matches!(
            registry.get_instance::<u16>(&mut stream, &[]),
            Err(ProvideError::Provision(_))
        ));
    }
}
