//! Modifier tags attached to parameter declarations.
//!
//! The parser reads `Classifier`, `Optional`, `Switch` and `Name`; every tag
//! is also forwarded to the provider, which interprets the rest.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    /// Selects a classified binding, e.g. `"text"` for the rest-of-line string.
    Classifier(String),
    /// Optional slot; the tokens are the default value (empty = none).
    Optional(Vec<String>),
    /// Flag slot. Boolean for `bool` parameters, a value flag otherwise.
    Switch(char),
    /// Inclusive numeric bounds.
    Range { min: Option<f64>, max: Option<f64> },
    /// Regex the whole token must match.
    Validate(String),
    /// Explicit parameter name for usage and error messages.
    Name(String),
}

impl Tag {
    pub fn optional<I, S>(defaults: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Tag::Optional(defaults.into_iter().map(Into::into).collect())
    }

    pub fn classifier(id: impl Into<String>) -> Self {
        Tag::Classifier(id.into())
    }
}

pub fn find_classifier(tags: &[Tag]) -> Option<&str> {
    tags.iter().find_map(|t| match t {
        Tag::Classifier(id) => Some(id.as_str()),
        _ => None,
    })
}

pub fn find_name(tags: &[Tag]) -> Option<&str> {
    tags.iter().find_map(|t| match t {
        Tag::Name(name) => Some(name.as_str()),
        _ => None,
    })
}

pub fn find_range(tags: &[Tag]) -> Option<(Option<f64>, Option<f64>)> {
    tags.iter().find_map(|t| match t {
        Tag::Range { min, max } => Some((*min, *max)),
        _ => None,
    })
}

pub fn find_validate(tags: &[Tag]) -> Option<&str> {
    tags.iter().find_map(|t| match t {
        Tag::Validate(pattern) => Some(pattern.as_str()),
        _ => None,
    })
}
