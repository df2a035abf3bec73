//! Tokenizer: raw command text to positional tokens plus flags.
//!
//! Rules, in the order they are applied:
//!
//! 1. Split on single spaces. Empty pieces (double spaces, a trailing space)
//!    are dropped but remembered, so completion can tell "typing a word" from
//!    "about to type the next word".
//! 2. A piece starting with `'` or `"` is merged with the following pieces up
//!    to the one ending in the same quote; the quotes are stripped. An
//!    unterminated quote leaves the pieces as literal tokens.
//! 3. A token matching `-[A-Za-z?]+` is a flag group. Every character in the
//!    group is a flag; characters in the expected value-flag set consume the
//!    next token as their value.
//! 4. A literal `--` ends flag parsing: everything after it is positional.
//!
//! The raw pieces and their indices are kept so a provider can reconstruct the
//! untokenized remainder of the line (see [`CommandLine::joined_from`]).

use std::collections::{BTreeMap, BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::error::CommandError;

/// Flag characters mapped to their value; boolean flags map to `"true"`.
pub type Flags = BTreeMap<char, String>;

/// The literal value recorded for a boolean flag.
pub const FLAG_PRESENT: &str = "true";

/// The flag-parsing terminator.
pub const FLAG_TERMINATOR: &str = "--";

static FLAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-[a-zA-Z?]+$").expect("flag pattern is a valid regex"));

/// Split raw text the way the dispatcher and completion do: on single spaces,
/// keeping empty pieces.
pub fn split_raw(text: &str) -> Vec<&str> {
    text.split(' ').collect()
}

/// Failures detected while tokenizing, before any stream exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("Value flag '{0}' already given")]
    DuplicateValueFlag(char),
    #[error("No value specified for the '-{0}' flag.")]
    MissingFlagValue(char),
}

impl From<TokenizeError> for CommandError {
    fn from(err: TokenizeError) -> Self {
        CommandError::Command(err.to_string())
    }
}

/// What completion should target after the last token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionContext {
    /// The line ends in whitespace (or is empty): a new positional value.
    HangingValue,
    /// The last token is a positional value still being typed.
    LastValue,
    /// The last token is (or should be) the value of this flag.
    FlagValue(char),
}

impl SuggestionContext {
    pub fn flag(&self) -> Option<char> {
        match self {
            SuggestionContext::FlagValue(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_hanging_value(&self) -> bool {
        matches!(self, SuggestionContext::HangingValue)
    }
}

/// Tokenizer settings. Build one per parser; `tokenize` is cheap.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    value_flags: HashSet<char>,
    allow_hanging_flag: bool,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag characters that consume the following token as their value.
    pub fn value_flags(mut self, flags: impl IntoIterator<Item = char>) -> Self {
        self.value_flags = flags.into_iter().collect();
        self
    }

    /// Tolerate a value flag at the very end of the line (completion).
    pub fn allow_hanging_flag(mut self, allow: bool) -> Self {
        self.allow_hanging_flag = allow;
        self
    }

    pub fn tokenize(&self, input: &str) -> Result<CommandLine, TokenizeError> {
        let raw: Vec<String> = split_raw(input).into_iter().map(str::to_string).collect();
        let (merged, is_hanging) = merge_quoted(&raw);

        let mut positional = Vec::with_capacity(merged.len());
        let mut positional_spans = Vec::with_capacity(merged.len());
        let mut value_flags: BTreeMap<char, String> = BTreeMap::new();
        let mut boolean_flags: BTreeSet<char> = BTreeSet::new();
        let mut suggestion_context = SuggestionContext::HangingValue;

        let mut next = 0;
        while next < merged.len() {
            let token = &merged[next];
            next += 1;
            suggestion_context = SuggestionContext::HangingValue;

            if !token.quoted && token.text == FLAG_TERMINATOR {
                while next < merged.len() {
                    positional_spans.push(merged[next].raw_span());
                    positional.push(merged[next].text.clone());
                    next += 1;
                }
                if !is_hanging && !positional.is_empty() {
                    suggestion_context = SuggestionContext::LastValue;
                }
                break;
            }

            if token.quoted || !FLAG_PATTERN.is_match(&token.text) {
                if !is_hanging {
                    suggestion_context = SuggestionContext::LastValue;
                }
                positional_spans.push(token.raw_span());
                positional.push(token.text.clone());
                continue;
            }

            for flag in token.text.chars().skip(1) {
                if !self.value_flags.contains(&flag) {
                    boolean_flags.insert(flag);
                    continue;
                }
                if value_flags.contains_key(&flag) {
                    return Err(TokenizeError::DuplicateValueFlag(flag));
                }
                if next >= merged.len() {
                    if self.allow_hanging_flag {
                        suggestion_context = SuggestionContext::FlagValue(flag);
                        break;
                    }
                    return Err(TokenizeError::MissingFlagValue(flag));
                }
                value_flags.insert(flag, merged[next].text.clone());
                next += 1;
                if !is_hanging {
                    suggestion_context = SuggestionContext::FlagValue(flag);
                }
            }
        }

        let mut flags: Flags = value_flags.clone();
        for flag in &boolean_flags {
            flags.insert(*flag, FLAG_PRESENT.to_string());
        }

        Ok(CommandLine {
            raw,
            positional,
            positional_spans,
            boolean_flags,
            value_flags,
            flags,
            suggestion_context,
        })
    }
}

struct MergedToken {
    text: String,
    raw_index: usize,
    /// Last raw piece of the token; differs from `raw_index` for quoted runs.
    raw_end: usize,
    quoted: bool,
}

impl MergedToken {
    fn raw_span(&self) -> (usize, usize) {
        (self.raw_index, self.raw_end)
    }
}

/// Drop empty pieces and merge quoted runs. Returns the merged tokens and
/// whether the line ended on an empty piece.
fn merge_quoted(raw: &[String]) -> (Vec<MergedToken>, bool) {
    let mut merged = Vec::with_capacity(raw.len());
    let mut is_hanging = false;
    let mut i = 0;

    while i < raw.len() {
        is_hanging = false;
        let piece = &raw[i];
        if piece.is_empty() {
            is_hanging = true;
            i += 1;
            continue;
        }

        let start = i;
        let mut text = piece.clone();
        let mut quoted = false;

        if let Some(quote) = piece.chars().next().filter(|c| *c == '\'' || *c == '"') {
            let mut build = String::new();
            let mut end = i;
            while end < raw.len() {
                let part = &raw[end];
                let closes = part.ends_with(quote) && (end != i || part.len() > 1);
                if closes {
                    if end != i {
                        build.push(' ');
                    }
                    let from = if end == i { 1 } else { 0 };
                    build.push_str(&part[from..part.len() - 1]);
                    break;
                } else if end == i {
                    build.push_str(&part[1..]);
                } else {
                    build.push(' ');
                    build.push_str(part);
                }
                end += 1;
            }

            if end < raw.len() {
                text = build;
                quoted = true;
                i = end;
            }

            if text.is_empty() {
                i += 1;
                continue;
            }
        }

        merged.push(MergedToken {
            text,
            raw_index: start,
            raw_end: i,
            quoted,
        });
        i += 1;
    }

    (merged, is_hanging)
}

/// Tokenizer output for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    raw: Vec<String>,
    positional: Vec<String>,
    /// First and last raw piece of each positional token.
    positional_spans: Vec<(usize, usize)>,
    boolean_flags: BTreeSet<char>,
    value_flags: BTreeMap<char, String>,
    flags: Flags,
    suggestion_context: SuggestionContext,
}

impl CommandLine {
    /// Tokenize with no value flags and no hanging-flag tolerance.
    pub fn parse(input: &str) -> Result<Self, TokenizeError> {
        Tokenizer::new().tokenize(input)
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    pub fn len(&self) -> usize {
        self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    /// Every flag, boolean flags mapped to `"true"`.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.contains_key(&flag)
    }

    /// Value of a value flag; `None` for boolean flags and absent flags.
    pub fn flag_value(&self, flag: char) -> Option<&str> {
        self.value_flags.get(&flag).map(String::as_str)
    }

    pub fn boolean_flags(&self) -> impl Iterator<Item = char> + '_ {
        self.boolean_flags.iter().copied()
    }

    pub fn suggestion_context(&self) -> SuggestionContext {
        self.suggestion_context
    }

    /// Positional tokens `start..=end` joined by single spaces.
    pub fn joined_range(&self, start: usize, end: usize) -> Option<String> {
        if start > end || end >= self.positional.len() {
            return None;
        }
        Some(self.positional[start..=end].join(" "))
    }

    /// The untokenized input from positional token `index` through the last
    /// positional token, as typed (quotes and inner spacing preserved).
    /// Flags and empty pieces after the last positional token are not part
    /// of it.
    pub fn joined_from(&self, index: usize) -> Option<String> {
        let (start, _) = *self.positional_spans.get(index)?;
        let (_, end) = *self.positional_spans.last()?;
        Some(self.raw[start..=end].join(" "))
    }
}
