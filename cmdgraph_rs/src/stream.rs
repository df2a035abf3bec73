//! Sequential readers over positional tokens.
//!
//! Providers only ever see `&mut dyn ArgumentStream`. Two shapes exist:
//! [`ContextStream`] over tokenizer output (knows the raw line, so "rest of
//! input" providers can recover original spacing) and [`StringListStream`]
//! over a plain list (used for flag projections and default values).

use crate::error::ArgumentError;
use crate::namespace::Namespace;
use crate::tokenizer::{CommandLine, Flags};

/// Position-tracked token reader. The cursor never moves backwards.
pub trait ArgumentStream {
    fn has_next(&self) -> bool;

    /// Next token, advancing the cursor. Missing when exhausted.
    fn next(&mut self) -> Result<String, ArgumentError>;

    /// Next token without advancing. Missing when exhausted.
    fn peek(&self) -> Result<String, ArgumentError>;

    fn position(&self) -> usize;

    fn size(&self) -> usize;

    /// Jump the cursor to the end.
    fn mark_consumed(&mut self);

    /// Tokens from the cursor to the end; does not advance.
    fn remaining(&self) -> Vec<String>;

    fn flags(&self) -> &Flags;

    fn namespace(&self) -> &Namespace;

    fn namespace_mut(&mut self) -> &mut Namespace;

    /// Untokenized input from the cursor onwards, when the stream knows it.
    fn raw_remainder(&self) -> Option<String> {
        None
    }

    fn next_int(&mut self) -> Result<i64, ArgumentError> {
        let token = self.next()?;
        token
            .parse()
            .map_err(|_| ArgumentError::parse(format!("Expected a number, got '{token}'")))
    }

    fn next_float(&mut self) -> Result<f64, ArgumentError> {
        let token = self.next()?;
        token
            .parse()
            .map_err(|_| ArgumentError::parse(format!("Expected a number, got '{token}'")))
    }

    fn next_bool(&mut self) -> Result<bool, ArgumentError> {
        let token = self.next()?;
        parse_bool(&token).ok_or_else(|| {
            ArgumentError::parse(format!("Expected a boolean (yes/no), got '{token}'"))
        })
    }
}

/// yes/true/y/1 and no/false/n/0, case-insensitive.
pub fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "yes" | "true" | "y" | "1" => Some(true),
        "no" | "false" | "n" | "0" => Some(false),
        _ => None,
    }
}

enum NamespaceSlot<'a> {
    Owned(Namespace),
    Borrowed(&'a mut Namespace),
}

impl NamespaceSlot<'_> {
    fn get(&self) -> &Namespace {
        match self {
            NamespaceSlot::Owned(ns) => ns,
            NamespaceSlot::Borrowed(ns) => ns,
        }
    }

    fn get_mut(&mut self) -> &mut Namespace {
        match self {
            NamespaceSlot::Owned(ns) => ns,
            NamespaceSlot::Borrowed(ns) => ns,
        }
    }
}

/// Stream over an explicit token list.
pub struct StringListStream<'a> {
    tokens: Vec<String>,
    position: usize,
    flags: Flags,
    namespace: NamespaceSlot<'a>,
}

impl<'a> StringListStream<'a> {
    /// A sub-view sharing flags and namespace with the stream it came from.
    pub fn new(tokens: Vec<String>, flags: Flags, namespace: &'a mut Namespace) -> Self {
        Self {
            tokens,
            position: 0,
            flags,
            namespace: NamespaceSlot::Borrowed(namespace),
        }
    }
}

impl StringListStream<'static> {
    /// A standalone stream with no flags and its own empty namespace.
    pub fn detached<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            position: 0,
            flags: Flags::new(),
            namespace: NamespaceSlot::Owned(Namespace::new()),
        }
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }
}

impl ArgumentStream for StringListStream<'_> {
    fn has_next(&self) -> bool {
        self.position < self.tokens.len()
    }

    fn next(&mut self) -> Result<String, ArgumentError> {
        let token = self.peek()?;
        self.position += 1;
        Ok(token)
    }

    fn peek(&self) -> Result<String, ArgumentError> {
        self.tokens
            .get(self.position)
            .cloned()
            .ok_or_else(ArgumentError::missing)
    }

    fn position(&self) -> usize {
        self.position
    }

    fn size(&self) -> usize {
        self.tokens.len()
    }

    fn mark_consumed(&mut self) {
        self.position = self.tokens.len();
    }

    fn remaining(&self) -> Vec<String> {
        self.tokens[self.position.min(self.tokens.len())..].to_vec()
    }

    fn flags(&self) -> &Flags {
        &self.flags
    }

    fn namespace(&self) -> &Namespace {
        self.namespace.get()
    }

    fn namespace_mut(&mut self) -> &mut Namespace {
        self.namespace.get_mut()
    }
}

/// Stream over tokenizer output for one command line.
pub struct ContextStream<'a> {
    line: CommandLine,
    position: usize,
    namespace: &'a mut Namespace,
}

impl<'a> ContextStream<'a> {
    pub fn new(line: CommandLine, namespace: &'a mut Namespace) -> Self {
        Self {
            line,
            position: 0,
            namespace,
        }
    }

    pub fn line(&self) -> &CommandLine {
        &self.line
    }
}

impl ArgumentStream for ContextStream<'_> {
    fn has_next(&self) -> bool {
        self.position < self.line.len()
    }

    fn next(&mut self) -> Result<String, ArgumentError> {
        let token = self.peek()?;
        self.position += 1;
        Ok(token)
    }

    fn peek(&self) -> Result<String, ArgumentError> {
        self.line
            .get(self.position)
            .map(str::to_string)
            .ok_or_else(ArgumentError::missing)
    }

    fn position(&self) -> usize {
        self.position
    }

    fn size(&self) -> usize {
        self.line.len()
    }

    fn mark_consumed(&mut self) {
        self.position = self.line.len();
    }

    fn remaining(&self) -> Vec<String> {
        self.line.positional()[self.position.min(self.line.len())..].to_vec()
    }

    fn flags(&self) -> &Flags {
        self.line.flags()
    }

    fn namespace(&self) -> &Namespace {
        self.namespace
    }

    fn namespace_mut(&mut self) -> &mut Namespace {
        self.namespace
    }

    fn raw_remainder(&self) -> Option<String> {
        self.line.joined_from(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::CommandLine;

    #[test]
    fn test_cursor_is_monotonic_and_mark_consumed_ends() {
        let mut stream = StringListStream::detached(["a", "b", "c"]);
        assert_eq!(stream.peek().expect("peek"), "a");
        assert_eq!(stream.next().expect("next"), "a");
        assert_eq!(stream.position(), 1);
        assert_eq!(stream.remaining(), vec!["b", "c"]);
        stream.mark_consumed();
        assert!(!stream.has_next());
        assert_eq!(stream.position(), stream.size());
        assert!(matches!(stream.next(), Err(ArgumentError::Missing { .. })));
        assert!(matches!(stream.peek(), Err(ArgumentError::Missing { .. })));
    }

    #[test]
    fn test_typed_readers() {
        let mut stream = StringListStream::detached(["42", "x", "Yes", "maybe", "2.5"]);
        assert_eq!(stream.next_int().expect("int"), 42);
        let err = stream.next_int().unwrap_err();
        assert_eq!(err.to_string(), "Expected a number, got 'x'");
        assert!(stream.next_bool().expect("bool"));
        let err = stream.next_bool().unwrap_err();
        assert_eq!(err.to_string(), "Expected a boolean (yes/no), got 'maybe'");
        assert_eq!(stream.next_float().expect("float"), 2.5);
    }

    #[test]
    fn test_sub_view_shares_namespace() {
        let mut ns = Namespace::new();
        {
            let mut view = StringListStream::new(vec!["true".into()], Flags::new(), &mut ns);
            view.namespace_mut().put(9_u8);
        }
        assert_eq!(ns.get::<u8>(), Some(&9));
    }

    #[test]
    fn test_context_stream_raw_remainder() {
        let line = CommandLine::parse("say 'hello  there' friend").expect("tokenize");
        let mut ns = Namespace::new();
        let mut stream = ContextStream::new(line, &mut ns);
        assert_eq!(stream.next().expect("next"), "say");
        assert_eq!(
            stream.raw_remainder().as_deref(),
            Some("'hello  there' friend")
        );
        assert_eq!(stream.remaining(), vec!["hello  there", "friend"]);
        stream.mark_consumed();
        assert_eq!(stream.raw_remainder(), None);
    }
}
