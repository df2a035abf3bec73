//! Parameter slot kinds and the stream projection each applies.
//!
//! A provider never knows whether it is reading a positional token or a
//! flag: the slot's [`OptionType`] hands it either the real stream or a
//! synthesized one-token view.

use serde::Serialize;

use crate::stream::{ArgumentStream, StringListStream};
use crate::tokenizer::FLAG_PRESENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "flag", rename_all = "snake_case")]
pub enum OptionType {
    RequiredPositional,
    OptionalPositional,
    /// Present → `"true"`, absent → `"false"`.
    BooleanFlag(char),
    /// Present → its value, absent → empty stream.
    ValueFlag(char),
}

impl OptionType {
    pub fn flag(&self) -> Option<char> {
        match self {
            OptionType::BooleanFlag(c) | OptionType::ValueFlag(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        !matches!(self, OptionType::RequiredPositional)
    }

    pub fn is_value_flag(&self) -> bool {
        matches!(self, OptionType::ValueFlag(_))
    }

    /// The stream the slot's provider reads from.
    pub fn project<'s>(&self, stream: &'s mut dyn ArgumentStream) -> Projection<'s> {
        match self {
            OptionType::RequiredPositional | OptionType::OptionalPositional => {
                Projection::Identity(stream)
            }
            OptionType::BooleanFlag(c) => {
                let flags = stream.flags().clone();
                let value = if flags.contains_key(c) {
                    FLAG_PRESENT
                } else {
                    "false"
                };
                Projection::Synthesized(StringListStream::new(
                    vec![value.to_string()],
                    flags,
                    stream.namespace_mut(),
                ))
            }
            OptionType::ValueFlag(c) => {
                let flags = stream.flags().clone();
                let tokens = flags.get(c).cloned().into_iter().collect();
                Projection::Synthesized(StringListStream::new(
                    tokens,
                    flags,
                    stream.namespace_mut(),
                ))
            }
        }
    }
}

/// Result of [`OptionType::project`].
pub enum Projection<'s> {
    Identity(&'s mut dyn ArgumentStream),
    Synthesized(StringListStream<'s>),
}

impl Projection<'_> {
    pub fn stream(&mut self) -> &mut dyn ArgumentStream {
        match self {
            Projection::Identity(stream) => &mut **stream,
            Projection::Synthesized(stream) => stream,
        }
    }
}
