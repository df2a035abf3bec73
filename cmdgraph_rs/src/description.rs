//! Command descriptions: parameter lists, help text and usage lines.

use serde::Serialize;

use crate::option_type::OptionType;

/// One user-facing parameter slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub option_type: OptionType,
    /// Tokens parsed when an optional slot receives nothing. Empty = no default.
    pub default_value: Vec<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, option_type: OptionType, default_value: Vec<String>) -> Self {
        Self {
            name: name.into(),
            option_type,
            default_value,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.option_type.is_optional()
    }

    /// `<name>`, `[name]`, `[-f]` or `[-f <name>]`.
    pub fn usage_fragment(&self) -> String {
        match self.option_type {
            OptionType::RequiredPositional => format!("<{}>", self.name),
            OptionType::OptionalPositional => format!("[{}]", self.name),
            OptionType::BooleanFlag(c) => format!("[-{c}]"),
            OptionType::ValueFlag(c) => format!("[-{c} <{}>]", self.name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Description {
    /// User-supplied parameters only; self-provided slots are not listed.
    pub parameters: Vec<Parameter>,
    pub short_description: Option<String>,
    pub help: Option<String>,
    pub usage_override: Option<String>,
    /// Permissions any one of which grants access.
    pub permissions: Vec<String>,
}

impl Description {
    pub fn builder() -> DescriptionBuilder {
        DescriptionBuilder::default()
    }

    pub fn usage(&self) -> String {
        if let Some(usage) = &self.usage_override {
            return usage.clone();
        }
        self.parameters
            .iter()
            .map(Parameter::usage_fragment)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default)]
pub struct DescriptionBuilder {
    description: Description,
}

impl DescriptionBuilder {
    pub fn parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.description.parameters = parameters;
        self
    }

    pub fn short_description(mut self, text: Option<String>) -> Self {
        self.description.short_description = text;
        self
    }

    pub fn help(mut self, text: Option<String>) -> Self {
        self.description.help = text;
        self
    }

    pub fn usage_override(mut self, usage: Option<String>) -> Self {
        self.description.usage_override = usage;
        self
    }

    pub fn permissions(mut self, permissions: Vec<String>) -> Self {
        self.description.permissions = permissions;
        self
    }

    pub fn current(&self) -> &Description {
        &self.description
    }

    /// In-place setter for listeners holding `&mut DescriptionBuilder`.
    pub fn set_usage_override(&mut self, usage: impl Into<String>) {
        self.description.usage_override = Some(usage.into());
    }

    pub fn build(self) -> Description {
        self.description
    }
}
