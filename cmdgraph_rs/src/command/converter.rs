//! Typed converters that turn host handler failures into command errors.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{CommandError, RegistrationError};

type ConvertFn = Arc<dyn Fn(&anyhow::Error) -> Option<CommandError> + Send + Sync>;

#[derive(Clone)]
struct Converter {
    type_id: TypeId,
    type_name: &'static str,
    convert: ConvertFn,
}

/// Maps host handler errors of known types to [`CommandError`]s.
///
/// Converters run in registration order and the first `Some` wins. Each
/// error type may be registered once.
#[derive(Clone, Default)]
pub struct ErrorConverters {
    converters: Vec<Converter>,
}

impl ErrorConverters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<E, F>(&mut self, convert: F) -> Result<(), RegistrationError>
    where
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(&E) -> Option<CommandError> + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<E>();
        let type_name = std::any::type_name::<E>();
        if self.converters.iter().any(|c| c.type_id == type_id) {
            return Err(RegistrationError::DuplicateConverter(type_name));
        }

        self.converters.push(Converter {
            type_id,
            type_name,
            convert: Arc::new(move |err: &anyhow::Error| err.downcast_ref::<E>().and_then(&convert)),
        });
        Ok(())
    }

    pub fn convert(&self, err: &anyhow::Error) -> Option<CommandError> {
        self.converters.iter().find_map(|c| {
            let converted = (c.convert)(err)?;
            debug!(error_type = c.type_name, "handler error converted");
            Some(converted)
        })
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl fmt::Debug for ErrorConverters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.converters.iter().map(|c| c.type_name))
            .finish()
    }
}
