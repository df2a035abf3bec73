//! Built-in providers and the module that installs them.

pub mod choice;
pub mod context;
pub mod number;
pub mod text;

pub use choice::EnumProvider;
pub use context::{ConstantProvider, NamespaceProvider, RawArgs, RawArgsProvider};
pub use number::{BooleanProvider, FloatProvider, IntegerProvider};
pub use text::{CharProvider, StringProvider, TEXT, TextProvider};

use crate::binding::{BindingModule, BindingRegistry};

/// Binds `bool`, the integer and float primitives, `char`, `String`,
/// `String` classified `"text"` and [`RawArgs`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitivesModule;

impl BindingModule for PrimitivesModule {
    fn configure(&self, registry: &mut BindingRegistry) {
        registry.bind::<bool>().to_provider(BooleanProvider);
        registry.bind::<i8>().to_provider(IntegerProvider::new());
        registry.bind::<i16>().to_provider(IntegerProvider::new());
        registry.bind::<i32>().to_provider(IntegerProvider::new());
        registry.bind::<i64>().to_provider(IntegerProvider::new());
        registry.bind::<u8>().to_provider(IntegerProvider::new());
        registry.bind::<u16>().to_provider(IntegerProvider::new());
        registry.bind::<u32>().to_provider(IntegerProvider::new());
        registry.bind::<u64>().to_provider(IntegerProvider::new());
        registry.bind::<f32>().to_provider(FloatProvider::new());
        registry.bind::<f64>().to_provider(FloatProvider::new());
        registry.bind::<char>().to_provider(CharProvider);
        registry.bind::<String>().to_provider(StringProvider);
        registry
            .bind::<String>()
            .with_classifier(TEXT)
            .to_provider(TextProvider);
        registry.bind::<RawArgs>().to_provider(RawArgsProvider);
    }
}
