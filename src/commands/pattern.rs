//! Command patterns and the pattern matcher
//!
//! A pattern is a space separated template such as `set <x> <y...>`. Literal
//! tokens match case-insensitively, `<name>` captures one token and a trailing
//! `<name...>` captures everything that is left.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Deterministic resolution order (exact length, literal count, registration)
//! - 1.0.0: Initial matcher

use anyhow::{bail, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use crate::core::DispatchError;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^<([^<>\s.]+)(\.\.\.)?>$").expect("placeholder regex is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Placeholder { name: String, variadic: bool },
}

impl Token {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.starts_with('<') || raw.ends_with('>') {
            let Some(caps) = placeholder_regex().captures(raw) else {
                bail!("Malformed placeholder '{raw}'");
            };
            return Ok(Token::Placeholder {
                name: caps[1].to_string(),
                variadic: caps.get(2).is_some(),
            });
        }
        Ok(Token::Literal(raw.to_string()))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Token::Placeholder { .. })
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, Token::Placeholder { variadic: true, .. })
    }

    pub fn placeholder_name(&self) -> Option<&str> {
        match self {
            Token::Placeholder { name, .. } => Some(name),
            Token::Literal(_) => None,
        }
    }

    /// Literal equality ignoring case; placeholders accept anything
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            Token::Literal(text) => text.eq_ignore_ascii_case(actual),
            Token::Placeholder { .. } => true,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(text) => write!(f, "{text}"),
            Token::Placeholder {
                name,
                variadic: true,
            } => write!(f, "<{name}...>"),
            Token::Placeholder { name, .. } => write!(f, "<{name}>"),
        }
    }
}

/// Captured token groups keyed by placeholder name
pub type CapturedArgs = HashMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
}

impl Pattern {
    /// Parse and validate a pattern
    ///
    /// Rejects duplicate placeholder names and a variadic placeholder that is
    /// not the final token.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = source
            .split_whitespace()
            .map(Token::parse)
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        for (i, token) in tokens.iter().enumerate() {
            if let Token::Placeholder { name, variadic } = token {
                if !seen.insert(name.as_str()) {
                    bail!("Placeholder <{name}> appears twice in '{source}'");
                }
                if *variadic && i + 1 != tokens.len() {
                    bail!("Variadic <{name}...> must be the last token in '{source}'");
                }
            }
        }

        Ok(Pattern {
            source: tokens
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" "),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token_at(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn has_variadic_tail(&self) -> bool {
        self.tokens.last().is_some_and(Token::is_variadic)
    }

    pub fn placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(Token::placeholder_name)
    }

    /// Literal tokens in the first `window` positions
    fn literal_count(&self, window: usize) -> usize {
        self.tokens
            .iter()
            .take(window)
            .filter(|t| !t.is_placeholder())
            .count()
    }

    /// Same length, relaxed rule on the final position
    pub fn matches_exact(&self, args: &[String]) -> bool {
        if self.tokens.len() != args.len() {
            return false;
        }
        let Some((last, init)) = self.tokens.split_last() else {
            return true;
        };
        init.iter().zip(args).all(|(t, a)| t.matches(a))
            && (last.is_variadic() || last.matches(&args[args.len() - 1]))
    }

    /// Different length, every shared position matches
    pub fn matches_prefix(&self, args: &[String]) -> bool {
        self.tokens.len() != args.len()
            && self.tokens.iter().zip(args).all(|(t, a)| t.matches(a))
    }

    /// Split `args` into named groups
    ///
    /// A trailing variadic placeholder always gets a group, possibly empty.
    pub fn extract(&self, args: &[String]) -> CapturedArgs {
        let mut captured = CapturedArgs::new();
        for (i, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Placeholder {
                    name,
                    variadic: true,
                } => {
                    captured.insert(name.clone(), args.get(i..).unwrap_or_default().to_vec());
                }
                Token::Placeholder { name, .. } => {
                    if let Some(arg) = args.get(i) {
                        captured.insert(name.clone(), vec![arg.clone()]);
                    }
                }
                Token::Literal(_) => {}
            }
        }
        captured
    }

    /// Re-validate the token count against this pattern
    ///
    /// Distinguishes a wrong token inside the shared prefix, surplus tokens
    /// after a non-variadic tail, and missing trailing placeholders.
    pub fn check_arity(&self, command: &str, args: &[String]) -> Result<(), DispatchError> {
        let shared = self.tokens.len().min(args.len());
        if let Some(position) = (0..shared).find(|&i| !self.tokens[i].matches(&args[i])) {
            return Err(self.mismatch(command, args, position));
        }

        if self.has_variadic_tail() && args.len() + 1 >= self.tokens.len() {
            return Ok(());
        }

        if args.len() > self.tokens.len() {
            return Err(self.mismatch(command, args, self.tokens.len()));
        }

        if args.len() < self.tokens.len() {
            return Err(DispatchError::MissingParameters {
                command: command.to_string(),
                given: args.to_vec(),
                missing: self.tokens[args.len()..]
                    .iter()
                    .filter(|t| !t.is_variadic())
                    .map(ToString::to_string)
                    .collect(),
                usage: self.source.clone(),
            });
        }

        Ok(())
    }

    fn mismatch(&self, command: &str, args: &[String], position: usize) -> DispatchError {
        DispatchError::ArgumentMismatch {
            command: command.to_string(),
            given: args[..position].to_vec(),
            position,
            offending: args[position].clone(),
            usage: self.source.clone(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Immutable pattern table in registration order
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: Vec<Pattern>,
}

impl PatternTable {
    pub fn new(patterns: Vec<Pattern>) -> Result<Self> {
        let mut seen = HashSet::new();
        for pattern in &patterns {
            if !seen.insert(pattern.as_str().to_lowercase()) {
                bail!("Pattern '{pattern}' is registered twice");
            }
        }
        Ok(Self { patterns })
    }

    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Pattern)> {
        self.patterns.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Index of the pattern `args` resolves to
    ///
    /// Empty input only resolves to the empty pattern. Otherwise same-length
    /// matches are preferred over prefix matches. Within either group the
    /// pattern with more literal tokens in the compared window wins, then a
    /// pattern whose arity accepts the input, then registration order.
    pub fn find(&self, args: &[String]) -> Option<usize> {
        if args.is_empty() {
            return self.patterns.iter().position(Pattern::is_empty);
        }

        let best = |candidates: Vec<usize>| -> Option<usize> {
            candidates.into_iter().min_by_key(|&i| {
                let pattern = &self.patterns[i];
                let window = pattern.len().min(args.len());
                let accepts = pattern.check_arity("", args).is_ok();
                (
                    std::cmp::Reverse(pattern.literal_count(window)),
                    !accepts,
                    i,
                )
            })
        };

        let exact = self
            .patterns
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_empty() && p.matches_exact(args))
            .map(|(i, _)| i)
            .collect();
        if let Some(found) = best(exact) {
            return Some(found);
        }

        let prefix = self
            .patterns
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_empty() && p.matches_prefix(args))
            .map(|(i, _)| i)
            .collect();
        best(prefix)
    }
}
