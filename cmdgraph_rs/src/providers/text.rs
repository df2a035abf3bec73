//! String, rest-of-line text and char providers, with `Tag::Validate` checks.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::binding::Provider;
use crate::error::{ArgumentError, ProvideError, ProvisionError};
use crate::stream::ArgumentStream;
use crate::tag::{Tag, find_validate};

/// Classifier selecting the rest-of-line string binding.
pub const TEXT: &str = "text";

/// Anchored `Tag::Validate` patterns, compiled on first use.
static PATTERNS: Lazy<Mutex<HashMap<String, Regex>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn compiled(pattern: &str) -> Result<Regex, regex::Error> {
    let mut cache = PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }
    let regex = Regex::new(&format!("^(?:{pattern})$"))?;
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

/// Check `value` against a `Tag::Validate` pattern; the whole value must match.
fn validate(value: &str, tags: &[Tag]) -> Result<(), ProvideError> {
    let Some(pattern) = find_validate(tags).filter(|p| !p.is_empty()) else {
        return Ok(());
    };
    let regex = compiled(pattern)
        .map_err(|e| ProvisionError::new(format!("Invalid validation pattern '{pattern}': {e}")))?;
    if !regex.is_match(value) {
        return Err(ArgumentError::parse(format!(
            "The given text doesn't match the right format (technically speaking, the 'format' is {pattern})"
        ))
        .into());
    }
    Ok(())
}

/// One token.
pub struct StringProvider;

impl Provider for StringProvider {
    type Output = String;

    fn get(&self, stream: &mut dyn ArgumentStream, tags: &[Tag]) -> Result<String, ProvideError> {
        let value = stream.next()?;
        validate(&value, tags)?;
        Ok(value)
    }
}

/// Everything left on the line, original spacing preserved when the stream
/// knows the raw input.
pub struct TextProvider;

impl Provider for TextProvider {
    type Output = String;

    fn get(&self, stream: &mut dyn ArgumentStream, tags: &[Tag]) -> Result<String, ProvideError> {
        if !stream.has_next() {
            return Err(ArgumentError::missing().into());
        }
        let value = stream
            .raw_remainder()
            .unwrap_or_else(|| stream.remaining().join(" "));
        stream.mark_consumed();
        validate(&value, tags)?;
        Ok(value)
    }
}

pub struct CharProvider;

impl Provider for CharProvider {
    type Output = char;

    fn get(&self, stream: &mut dyn ArgumentStream, _tags: &[Tag]) -> Result<char, ProvideError> {
        let token = stream.next()?;
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ArgumentError::parse(format!(
                "Expected a single character, got '{token}'"
            ))
            .into()),
        }
    }
}
