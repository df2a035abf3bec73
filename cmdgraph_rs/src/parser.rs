//! Binds an ordered parameter list against an argument stream.
//!
//! An [`ArgumentParser`] is built once per command. Each declared slot gets
//! its [`OptionType`] from the `Optional`/`Switch` tags and its [`Binding`]
//! from the registry; building fails fast on anything that could only go
//! wrong later at call time.

use std::any::Any;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use tracing::trace;

use crate::binding::{Binding, BindingRegistry, Key, TypeDescriptor};
use crate::description::Parameter;
use crate::error::{ArgumentError, ParametricError, ParseError, ProvideError};
use crate::namespace::Namespace;
use crate::option_type::OptionType;
use crate::stream::{ArgumentStream, StringListStream};
use crate::tag::{Tag, find_classifier, find_name};
use crate::tokenizer::{SuggestionContext, Tokenizer, split_raw};

/// One declared handler parameter: its type and its modifier tags.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub descriptor: TypeDescriptor,
    pub tags: Vec<Tag>,
}

impl ParameterSpec {
    pub fn of<T: Any>() -> Self {
        Self {
            descriptor: TypeDescriptor::of::<T>(),
            tags: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn named(self, name: impl Into<String>) -> Self {
        self.tag(Tag::Name(name.into()))
    }

    pub fn classified(self, classifier: impl Into<String>) -> Self {
        self.tag(Tag::Classifier(classifier.into()))
    }

    /// Optional slot with the given default tokens (none = absent when omitted).
    pub fn optional<I, S>(self, defaults: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag(Tag::optional(defaults))
    }

    pub fn switch(self, flag: char) -> Self {
        self.tag(Tag::Switch(flag))
    }
}

/// Values produced by [`ArgumentParser::parse_arguments`], one per declared
/// parameter. Optional slots with no input and no default are `None`.
#[derive(Default)]
pub struct BoundArgs {
    values: Vec<Option<Box<dyn Any + Send>>>,
}

impl BoundArgs {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_present(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(Some(_)))
    }

    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.as_ref()?.downcast_ref::<T>()
    }

    /// Move a value out. A second `take` of the same slot yields `None`.
    pub fn take<T: Any>(&mut self, index: usize) -> Option<T> {
        let slot = self.values.get_mut(index)?;
        match slot.take()?.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                *slot = Some(other);
                None
            }
        }
    }

    /// Like [`take`](Self::take), for handlers that want `?`.
    pub fn require<T: Any>(&mut self, index: usize) -> anyhow::Result<T> {
        self.take(index).ok_or_else(|| {
            anyhow::anyhow!(
                "argument #{index} is absent or not a {}",
                std::any::type_name::<T>()
            )
        })
    }
}

impl fmt::Debug for BoundArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(|v| v.is_some()))
            .finish()
    }
}

struct ParameterEntry {
    parameter: Parameter,
    binding: Binding,
    tags: Vec<Tag>,
}

pub struct ArgumentParser {
    entries: Vec<ParameterEntry>,
    user_parameters: Vec<usize>,
    value_flags: BTreeSet<char>,
    allow_hanging_flags: bool,
}

impl ArgumentParser {
    pub fn builder(registry: &BindingRegistry) -> ArgumentParserBuilder<'_> {
        ArgumentParserBuilder {
            registry,
            entries: Vec::new(),
            user_parameters: Vec::new(),
            value_flags: BTreeSet::new(),
            seen_optional: false,
            allow_hanging_flags: true,
        }
    }

    /// Every declared parameter, self-provided ones included.
    pub fn parameters(&self) -> Vec<Parameter> {
        self.entries.iter().map(|e| e.parameter.clone()).collect()
    }

    /// Parameters the user types; self-provided slots are left out.
    pub fn user_parameters(&self) -> Vec<Parameter> {
        self.user_parameters
            .iter()
            .map(|&i| self.entries[i].parameter.clone())
            .collect()
    }

    pub fn value_flags(&self) -> &BTreeSet<char> {
        &self.value_flags
    }

    /// Tokenizer configured with this parser's value flags.
    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new().value_flags(self.value_flags.iter().copied())
    }

    /// Bind every parameter in declaration order, then reject leftovers.
    pub fn parse_arguments(
        &self,
        stream: &mut dyn ArgumentStream,
        ignore_unused_flags: bool,
        unused_flags: &HashSet<char>,
    ) -> Result<BoundArgs, ParseError> {
        let mut values = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            let option_type = entry.parameter.option_type;
            let result = {
                let mut projected = option_type.project(stream);
                entry.binding.get(projected.stream(), &entry.tags)
            };

            match result {
                Ok(value) => values.push(Some(value)),
                Err(ProvideError::Argument(ArgumentError::Missing { .. })) => {
                    if !option_type.is_optional() {
                        return Err(ArgumentError::missing()
                            .for_parameter(&entry.parameter)
                            .into());
                    }
                    values.push(self.default_value(entry, stream)?);
                }
                Err(ProvideError::Argument(err)) => {
                    return Err(err.for_parameter(&entry.parameter).into());
                }
                Err(ProvideError::Provision(err)) => return Err(err.into()),
            }
        }

        self.check_unconsumed(stream, ignore_unused_flags, unused_flags)?;
        Ok(BoundArgs { values })
    }

    fn default_value(
        &self,
        entry: &ParameterEntry,
        stream: &mut dyn ArgumentStream,
    ) -> Result<Option<Box<dyn Any + Send>>, ParseError> {
        let defaults = &entry.parameter.default_value;
        if defaults.is_empty() {
            return Ok(None);
        }

        trace!(parameter = %entry.parameter.name, "using default value");
        let flags = stream.flags().clone();
        let mut default_stream = StringListStream::new(defaults.clone(), flags, stream.namespace_mut());
        entry
            .binding
            .get(&mut default_stream, &entry.tags)
            .map(Some)
            .map_err(|err| {
                ParseError::IllegalParameter(format!(
                    "No value was specified for the '{}' parameter so the default value '{}' was used, but this value doesn't work due to an error: {}",
                    entry.parameter.name,
                    defaults.join(" "),
                    err
                ))
            })
    }

    fn check_unconsumed(
        &self,
        stream: &mut dyn ArgumentStream,
        ignore_unused_flags: bool,
        unused_flags: &HashSet<char>,
    ) -> Result<(), ArgumentError> {
        let mut unconsumed = Vec::new();

        if !ignore_unused_flags {
            let claimed: HashSet<char> = self
                .entries
                .iter()
                .filter_map(|e| e.parameter.option_type.flag())
                .collect();
            for flag in stream.flags().keys() {
                if unused_flags.contains(flag) || claimed.contains(flag) {
                    continue;
                }
                unconsumed.push(format!("-{flag}"));
            }
        }

        unconsumed.extend(stream.remaining());
        stream.mark_consumed();

        if unconsumed.is_empty() {
            Ok(())
        } else {
            Err(ArgumentError::Unused {
                unconsumed: unconsumed.join(" "),
            })
        }
    }

    /// Completion for what the user has typed so far.
    ///
    /// A trailing value flag completes through that flag's provider.
    /// Otherwise the number of space-separated pieces picks the user
    /// parameter, and the last piece is the prefix.
    pub fn parse_suggestions(&self, arguments: &str, namespace: &Namespace) -> Vec<String> {
        if self.allow_hanging_flags {
            if let Some(suggestions) = self.flag_suggestions(arguments, namespace) {
                return suggestions;
            }
        }

        let split = split_raw(arguments);
        let arg_id = split.len() - 1;
        let prefix = split[arg_id];

        let Some(&index) = self.user_parameters.get(arg_id) else {
            return Vec::new();
        };
        let entry = &self.entries[index];
        entry.binding.suggest(prefix, namespace, &entry.tags)
    }

    fn flag_suggestions(&self, arguments: &str, namespace: &Namespace) -> Option<Vec<String>> {
        let line = self
            .tokenizer()
            .allow_hanging_flag(true)
            .tokenize(arguments)
            .ok()?;
        let SuggestionContext::FlagValue(flag) = line.suggestion_context() else {
            return None;
        };
        let entry = self
            .entries
            .iter()
            .find(|e| e.parameter.option_type == OptionType::ValueFlag(flag))?;
        let prefix = line.flag_value(flag).unwrap_or("");
        Some(entry.binding.suggest(prefix, namespace, &entry.tags))
    }
}

impl fmt::Debug for ArgumentParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentParser")
            .field("parameters", &self.parameters())
            .field("value_flags", &self.value_flags)
            .finish()
    }
}

pub struct ArgumentParserBuilder<'r> {
    registry: &'r BindingRegistry,
    entries: Vec<ParameterEntry>,
    user_parameters: Vec<usize>,
    value_flags: BTreeSet<char>,
    seen_optional: bool,
    allow_hanging_flags: bool,
}

impl ArgumentParserBuilder<'_> {
    /// Complete a trailing value flag's value in `parse_suggestions`.
    pub fn allow_hanging_flags(mut self, allow: bool) -> Self {
        self.allow_hanging_flags = allow;
        self
    }

    pub fn add_parameter(&mut self, spec: ParameterSpec) -> Result<(), ParametricError> {
        let index = self.entries.len();
        let mut option_type = None;
        let mut default_value = Vec::new();

        for tag in &spec.tags {
            match tag {
                Tag::Switch(flag) => {
                    if option_type.is_some() {
                        return Err(both_tags(index));
                    }
                    option_type = Some(if spec.descriptor == TypeDescriptor::of::<bool>() {
                        OptionType::BooleanFlag(*flag)
                    } else {
                        OptionType::ValueFlag(*flag)
                    });
                }
                Tag::Optional(defaults) => {
                    if option_type.is_some() {
                        return Err(both_tags(index));
                    }
                    self.seen_optional = true;
                    option_type = Some(OptionType::OptionalPositional);
                    default_value = defaults.clone();
                }
                _ => {}
            }
        }

        let option_type = option_type.unwrap_or(OptionType::RequiredPositional);
        if self.seen_optional && !option_type.is_optional() {
            return Err(ParametricError::IllegalParameter(format!(
                "An non-optional parameter followed an optional parameter at #{index}"
            )));
        }

        let classifier = find_classifier(&spec.tags);
        let key = Key::new(spec.descriptor, classifier.map(str::to_string));
        let binding = self.registry.lookup(&key).cloned().ok_or_else(|| {
            ParametricError::IllegalParameter(format!(
                "Can't find a binding for the parameter type '{}'{}",
                spec.descriptor.simple_name(),
                classifier
                    .map(|c| format!(" classified '{c}'"))
                    .unwrap_or_default()
            ))
        })?;

        let parameter = Parameter::new(
            friendly_name(&spec, classifier, index),
            option_type,
            default_value,
        );

        if let OptionType::ValueFlag(flag) = option_type {
            self.value_flags.insert(flag);
        }
        if !binding.is_self_provided() {
            self.user_parameters.push(index);
        }

        self.entries.push(ParameterEntry {
            parameter,
            binding,
            tags: spec.tags,
        });
        Ok(())
    }

    pub fn build(self) -> ArgumentParser {
        ArgumentParser {
            entries: self.entries,
            user_parameters: self.user_parameters,
            value_flags: self.value_flags,
            allow_hanging_flags: self.allow_hanging_flags,
        }
    }
}

fn both_tags(index: usize) -> ParametricError {
    ParametricError::IllegalParameter(format!(
        "Both Optional and Switch were found on the same element for parameter #{index}"
    ))
}

fn friendly_name(spec: &ParameterSpec, classifier: Option<&str>, index: usize) -> String {
    if let Some(name) = find_name(&spec.tags) {
        return name.to_string();
    }
    if let Some(classifier) = classifier {
        return classifier.to_lowercase();
    }
    let simple = spec.descriptor.simple_name();
    if simple.is_empty() {
        format!("unknown{index}")
    } else {
        simple.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;
    use crate::providers::{EnumProvider, PrimitivesModule, RawArgs, TEXT};
    use crate::stream::ContextStream;
    use crate::tokenizer::CommandLine;

    fn registry() -> BindingRegistry {
        let mut registry = BindingRegistry::new();
        registry.install(&PrimitivesModule);
        registry
    }

    fn build_parser(registry: &BindingRegistry, specs: Vec<ParameterSpec>) -> ArgumentParser {
        let mut builder = ArgumentParser::builder(registry);
        for spec in specs {
            builder.add_parameter(spec).expect("valid parameter");
        }
        builder.build()
    }

    fn string_and_count(registry: &BindingRegistry) -> ArgumentParser {
        build_parser(
            registry,
            vec![
                ParameterSpec::of::<String>(),
                ParameterSpec::of::<i32>().optional(["5"]),
            ],
        )
    }

    fn parse(parser: &ArgumentParser, input: &str) -> Result<BoundArgs, ParseError> {
        let line = parser.tokenizer().tokenize(input).expect("tokenize");
        let mut ns = Namespace::new();
        let mut stream = ContextStream::new(line, &mut ns);
        parser.parse_arguments(&mut stream, false, &HashSet::new())
    }

    #[test]
    fn test_default_fills_missing_optional() {
        let registry = registry();
        let parser = string_and_count(&registry);
        let mut args = parse(&parser, "abc").expect("parse");
        assert_eq!(args.take::<String>(0).as_deref(), Some("abc"));
        assert_eq!(args.take::<i32>(1), Some(5));
    }

    #[test]
    fn test_missing_required_names_parameter() {
        let registry = registry();
        let parser = string_and_count(&registry);
        let err = parse(&parser, "").unwrap_err();
        match err {
            ParseError::Argument(ArgumentError::Missing { parameter }) => {
                assert_eq!(parameter.map(|p| p.name), Some("string".to_string()));
            }
            other => panic!("expected missing argument, got {other:?}"),
        }
    }

    #[test]
    fn test_leftover_tokens_are_unused() {
        let registry = registry();
        let parser = string_and_count(&registry);
        let err = parse(&parser, "abc 7 extra").unwrap_err();
        match err {
            ParseError::Argument(ArgumentError::Unused { unconsumed }) => {
                assert_eq!(unconsumed, "extra");
            }
            other => panic!("expected unused argument, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_names_parameter() {
        let registry = registry();
        let parser = string_and_count(&registry);
        let err = parse(&parser, "abc seven").unwrap_err();
        match err {
            ParseError::Argument(ArgumentError::Parse { message, parameter }) => {
                assert_eq!(message, "Expected 'seven' to be a number");
                assert_eq!(parameter.map(|p| p.name), Some("i32".to_string()));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_flags_bind_and_unclaimed_flags_are_reported() {
        let registry = registry();
        let parser = build_parser(
            &registry,
            vec![
                ParameterSpec::of::<String>().named("target"),
                ParameterSpec::of::<bool>().switch('s'),
                ParameterSpec::of::<u32>().switch('t'),
            ],
        );
        assert_eq!(parser.value_flags().iter().copied().collect::<Vec<_>>(), vec!['t']);

        let mut args = parse(&parser, "steve -s -t 30").expect("parse");
        assert_eq!(args.take::<String>(0).as_deref(), Some("steve"));
        assert_eq!(args.take::<bool>(1), Some(true));
        assert_eq!(args.take::<u32>(2), Some(30));

        let mut args = parse(&parser, "steve").expect("parse");
        assert_eq!(args.take::<bool>(1), Some(false));
        assert!(!args.is_present(2));

        let err = parse(&parser, "steve -x -q leftover").unwrap_err();
        assert_eq!(err.to_string(), "unused arguments: -q -x leftover");
    }

    #[test]
    fn test_ignored_and_allow_listed_flags() {
        let registry = registry();
        let parser = build_parser(&registry, vec![ParameterSpec::of::<String>()]);
        let line = CommandLine::parse("abc -a -b").expect("tokenize");

        let mut ns = Namespace::new();
        {
            let mut stream = ContextStream::new(line.clone(), &mut ns);
            assert!(parser.parse_arguments(&mut stream, true, &HashSet::new()).is_ok());
        }
        {
            let mut stream = ContextStream::new(line.clone(), &mut ns);
            let allow: HashSet<char> = ['a'].into_iter().collect();
            let err = parser
                .parse_arguments(&mut stream, false, &allow)
                .unwrap_err();
            assert_eq!(err.to_string(), "unused arguments: -b");
        }
        {
            let mut stream = ContextStream::new(line, &mut ns);
            let allow: HashSet<char> = ['a', 'b'].into_iter().collect();
            assert!(parser.parse_arguments(&mut stream, false, &allow).is_ok());
        }
    }

    #[test]
    fn test_broken_default_is_illegal_parameter() {
        let registry = registry();
        let parser = build_parser(
            &registry,
            vec![ParameterSpec::of::<i32>().named("count").optional(["many"])],
        );
        let err = parse(&parser, "").unwrap_err();
        match err {
            ParseError::IllegalParameter(message) => assert_eq!(
                message,
                "No value was specified for the 'count' parameter so the default value 'many' was used, but this value doesn't work due to an error: Expected 'many' to be a number"
            ),
            other => panic!("expected illegal parameter, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_without_default_is_absent() {
        let registry = registry();
        let parser = build_parser(
            &registry,
            vec![ParameterSpec::of::<String>().optional(Vec::<String>::new())],
        );
        let args = parse(&parser, "").expect("parse");
        assert_eq!(args.len(), 1);
        assert!(!args.is_present(0));
    }

    #[test]
    fn test_build_time_errors() {
        let registry = registry();

        let mut builder = ArgumentParser::builder(&registry);
        let err = builder
            .add_parameter(ParameterSpec::of::<i32>().optional(["1"]).switch('n'))
            .unwrap_err();
        assert!(err.to_string().contains("Both Optional and Switch"));

        let mut builder = ArgumentParser::builder(&registry);
        builder
            .add_parameter(ParameterSpec::of::<i32>().optional(["1"]))
            .expect("optional");
        let err = builder
            .add_parameter(ParameterSpec::of::<String>())
            .unwrap_err();
        assert!(
            err.to_string()
                .contains("An non-optional parameter followed an optional parameter at #1")
        );

        let mut builder = ArgumentParser::builder(&registry);
        let err = builder
            .add_parameter(ParameterSpec::of::<usize>())
            .unwrap_err();
        assert!(err.to_string().contains("Can't find a binding"));

        let mut builder = ArgumentParser::builder(&registry);
        let err = builder
            .add_parameter(ParameterSpec::of::<String>().classified("nope"))
            .unwrap_err();
        assert!(err.to_string().contains("classified 'nope'"));
    }

    #[test]
    fn test_friendly_names_and_user_parameters() {
        let registry = registry();
        let parser = build_parser(
            &registry,
            vec![
                ParameterSpec::of::<RawArgs>(),
                ParameterSpec::of::<u8>(),
                ParameterSpec::of::<String>().classified(TEXT),
            ],
        );
        let names: Vec<_> = parser.parameters().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["rawargs", "u8", "text"]);
        let user: Vec<_> = parser.user_parameters().into_iter().map(|p| p.name).collect();
        assert_eq!(user, vec!["u8", "text"]);
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Mode {
        Survival,
        Creative,
    }

    fn mode_parser(registry: &mut BindingRegistry) -> ArgumentParser {
        registry.bind::<Mode>().to_provider(EnumProvider::new(
            "Mode",
            [("SURVIVAL", Mode::Survival), ("CREATIVE", Mode::Creative)],
        ));
        build_parser(
            registry,
            vec![
                ParameterSpec::of::<String>(),
                ParameterSpec::of::<Mode>(),
                ParameterSpec::of::<Mode>().named("fallback").switch('f'),
            ],
        )
    }

    #[test]
    fn test_suggestions_by_position() {
        let mut registry = registry();
        let parser = mode_parser(&mut registry);
        let ns = Namespace::new();
        assert!(parser.parse_suggestions("ste", &ns).is_empty());
        assert_eq!(parser.parse_suggestions("steve c", &ns), vec!["creative"]);
        assert_eq!(
            parser.parse_suggestions("steve ", &ns),
            vec!["survival", "creative"]
        );
        assert!(parser.parse_suggestions("steve creative x y", &ns).is_empty());
    }

    #[test]
    fn test_suggestions_for_hanging_value_flag() {
        let mut registry = registry();
        let parser = mode_parser(&mut registry);
        let ns = Namespace::new();
        assert_eq!(parser.parse_suggestions("steve -f", &ns).len(), 2);
        assert_eq!(parser.parse_suggestions("steve -f su", &ns), vec!["survival"]);
    }

    #[test]
    fn test_suggestions_are_repeatable() {
        let mut registry = registry();
        let parser = mode_parser(&mut registry);
        let ns = Namespace::new();
        let first = parser.parse_suggestions("steve s", &ns);
        let second = parser.parse_suggestions("steve s", &ns);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bound_args_take_is_typed() {
        let registry = registry();
        let parser = string_and_count(&registry);
        let mut args = parse(&parser, "abc 9").expect("parse");
        assert_eq!(args.get::<i32>(1), Some(&9));
        assert_eq!(args.take::<String>(1), None);
        assert_eq!(args.take::<i32>(1), Some(9));
        assert!(args.require::<i32>(1).is_err());
    }
}
