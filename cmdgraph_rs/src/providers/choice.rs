//! Fixed-choice providers.

use crate::binding::Provider;
use crate::error::{ArgumentError, ProvideError};
use crate::namespace::Namespace;
use crate::stream::ArgumentStream;
use crate::tag::Tag;

/// Lowercase with everything but ASCII letters and digits removed.
fn simplify(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Picks one value from a fixed list of named choices.
///
/// Matching ignores case and punctuation, so `gold_ingot`, `Gold-Ingot` and
/// `goldingot` all select the same entry.
pub struct EnumProvider<T> {
    type_name: String,
    choices: Vec<(String, T)>,
}

impl<T> EnumProvider<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<I, S>(type_name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
    {
        Self {
            type_name: type_name.into(),
            choices: choices.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }
}

impl<T> Provider for EnumProvider<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    fn get(&self, stream: &mut dyn ArgumentStream, _tags: &[Tag]) -> Result<T, ProvideError> {
        let token = stream.next()?;
        let wanted = simplify(&token);
        self.choices
            .iter()
            .find(|(name, _)| simplify(name) == wanted)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| {
                ArgumentError::parse(format!(
                    "No matching value found in the '{}' list.",
                    self.type_name
                ))
                .into()
            })
    }

    fn suggest(&self, prefix: &str, _namespace: &Namespace, _tags: &[Tag]) -> Vec<String> {
        let wanted = simplify(prefix);
        self.choices
            .iter()
            .filter(|(name, _)| simplify(name).starts_with(&wanted))
            .map(|(name, _)| name.to_lowercase())
            .collect()
    }
}
