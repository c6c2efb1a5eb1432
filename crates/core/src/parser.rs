//! The parser monad.
//!
//! A [`Parser`] wraps a pure function from a token slice to a
//! [`ParseResult`]: either the bindings it produced plus the unconsumed
//! remainder, or a [`ParseError`]. Parsers are immutable values; every
//! combinator returns a new one.

use std::fmt;
use std::ops::{BitOr, Shr};
use std::sync::Arc;

use crate::args::{Args, Binding, Bindings};
use crate::error::{ParseError, UsageError};
use crate::primitives::done;
use crate::usage::Usage;

/// Tokens that short-circuit `parse_args` into a help request.
pub const HELP_TOKENS: [&str; 2] = ["-h", "--help"];

/// A successful step: bindings plus the unconsumed tail of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<'a> {
    pub bindings: Bindings,
    pub rest: &'a [String],
}

pub type ParseResult<'a> = Result<Parsed<'a>, ParseError>;

type RunFn = dyn for<'a> Fn(&'a [String]) -> ParseResult<'a> + Send + Sync;

/// What a top-level parse hands back when it does not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation<T> {
    Parsed(T),
    /// `-h`/`--help` was given; carries the rendered help text.
    Help(String),
}

impl<T> Invocation<T> {
    pub fn parsed(self) -> Option<T> {
        match self {
            Invocation::Parsed(value) => Some(value),
            Invocation::Help(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct Parser {
    run: Arc<RunFn>,
    usage: Usage,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("usage", &self.usage.render())
            .finish()
    }
}

impl Parser {
    pub fn new<F>(usage: Usage, run: F) -> Self
    where
        F: for<'a> Fn(&'a [String]) -> ParseResult<'a> + Send + Sync + 'static,
    {
        Parser {
            run: Arc::new(run),
            usage,
        }
    }

    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Attach a help line for `key` to this parser's usage.
    pub fn help(self, key: impl Into<String>, text: impl Into<String>) -> Self {
        let usage = Usage::described(self.usage.clone(), key, text);
        self.with_usage(usage)
    }

    pub fn parse<'a>(&self, input: &'a [String]) -> ParseResult<'a> {
        (self.run)(input)
    }

    // ── Monad ────────────────────────────────────────────────────────

    /// Always succeeds with `bindings`, consuming nothing.
    pub fn ret(bindings: Bindings) -> Self {
        Parser::new(Usage::Empty, move |input| {
            Ok(Parsed {
                bindings: bindings.clone(),
                rest: input,
            })
        })
    }

    /// `ret` with no bindings.
    pub fn empty() -> Self {
        Parser::ret(Vec::new())
    }

    /// Always fails with `EmptyAlternative`; the identity of `|`.
    pub fn zero() -> Self {
        Parser::new(Usage::Never, |_| Err(ParseError::EmptyAlternative))
    }

    /// Always fails with `error`, consuming nothing.
    pub fn fail(error: ParseError) -> Self {
        Parser::new(Usage::Never, move |_| Err(error.clone()))
    }

    /// Run `self`, feed its bindings to `f`, and run the resulting parser on
    /// the remainder. Failures propagate unchanged.
    ///
    /// The continuation is opaque, so the usage is that of `self`; combinators
    /// built on `bind` set their own usage.
    pub fn bind<F>(self, f: F) -> Self
    where
        F: Fn(Bindings) -> Parser + Send + Sync + 'static,
    {
        let usage = self.usage.clone();
        Parser::new(usage, move |input| {
            let first = self.parse(input)?;
            f(first.bindings).parse(first.rest)
        })
    }

    /// Sequence (`>>`): both must succeed; bindings concatenate in order.
    pub fn then(self, next: Parser) -> Self {
        let usage = Usage::seq(self.usage.clone(), next.usage.clone());
        self.bind(move |first| {
            next.clone().bind(move |second| {
                let mut bindings = first.clone();
                bindings.extend(second);
                Parser::ret(bindings)
            })
        })
        .with_usage(usage)
    }

    /// Alternation (`|`): run `self`; only if it fails, run `other` on the
    /// same input. If both fail their errors merge.
    pub fn or(self, other: Parser) -> Self {
        let usage = Usage::alt(self.usage.clone(), other.usage.clone());
        Parser::new(usage, move |input| match self.parse(input) {
            Ok(parsed) => Ok(parsed),
            Err(left) => other.parse(input).map_err(|right| left.merge(right)),
        })
    }

    /// Transform the bindings of a successful parse.
    pub fn map_bindings<F>(self, f: F) -> Self
    where
        F: Fn(Bindings) -> Bindings + Send + Sync + 'static,
    {
        let usage = self.usage.clone();
        Parser::new(usage, move |input| {
            let parsed = self.parse(input)?;
            Ok(Parsed {
                bindings: f(parsed.bindings),
                rest: parsed.rest,
            })
        })
    }

    /// Match as usual but bind nothing.
    pub fn ignore(self) -> Self {
        self.map_bindings(|_| Vec::new())
    }

    /// `self | ret(empty)`: a failed match binds no key at all.
    pub fn optional(self) -> Self {
        self.or(Parser::empty())
    }

    /// One or more repetitions. Fails exactly when the first application
    /// fails, with that failure.
    pub fn many1(self) -> Self {
        let usage = Usage::many1(self.usage.clone());
        Parser::new(usage, move |input| {
            let first = self.parse(input)?;
            let mut bindings = mark_repeated(first.bindings);
            let mut rest = first.rest;
            if rest.len() < input.len() {
                let (more, tail) = repeat(&self, rest);
                bindings.extend(more);
                rest = tail;
            }
            Ok(Parsed { bindings, rest })
        })
    }

    /// Zero or more repetitions; always succeeds.
    pub fn many(self) -> Self {
        let usage = Usage::many(self.usage.clone());
        Parser::new(usage, move |input| {
            let (bindings, rest) = repeat(&self, input);
            Ok(Parsed { bindings, rest })
        })
    }

    // ── Entry points ─────────────────────────────────────────────────

    /// Usage line followed by any help lines.
    pub fn help_text(&self) -> String {
        self.usage.help_text()
    }

    /// Parse the whole token list and return the raw bindings.
    pub fn parse_bindings<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Bindings, UsageError> {
        let tokens = owned(tokens);
        let whole = self.clone().then(done());
        whole
            .parse(&tokens)
            .map(|parsed| parsed.bindings)
            .map_err(|error| UsageError::new(self.usage.render(), error))
    }

    /// Parse the whole token list into nested [`Args`].
    ///
    /// A `-h`/`--help` token anywhere short-circuits to
    /// [`Invocation::Help`] before any matching is attempted.
    pub fn parse_args<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Invocation<Args>, UsageError> {
        if help_requested(tokens) {
            tracing::debug!("help requested");
            return Ok(Invocation::Help(self.help_text()));
        }
        let bindings = self.parse_bindings(tokens)?;
        tracing::debug!(bindings = bindings.len(), "parse succeeded");
        Ok(Invocation::Parsed(Args::from_bindings(&bindings)))
    }

    /// `parse_args` over the process arguments, minus the program name.
    pub fn parse_env_args(&self) -> Result<Invocation<Args>, UsageError> {
        let tokens: Vec<String> = std::env::args().skip(1).collect();
        self.parse_args(&tokens)
    }
}

pub(crate) fn help_requested<S: AsRef<str>>(tokens: &[S]) -> bool {
    tokens.iter().any(|t| HELP_TOKENS.contains(&t.as_ref()))
}

pub(crate) fn owned<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens.iter().map(|t| t.as_ref().to_owned()).collect()
}

fn mark_repeated(bindings: Bindings) -> Bindings {
    bindings
        .into_iter()
        .map(|b| Binding {
            repeated: true,
            ..b
        })
        .collect()
}

/// Apply `p` until it fails or stops consuming input.
fn repeat<'a>(p: &Parser, input: &'a [String]) -> (Bindings, &'a [String]) {
    let mut bindings = Vec::new();
    let mut rest = input;
    while let Ok(parsed) = p.parse(rest) {
        let progressed = parsed.rest.len() < rest.len();
        bindings.extend(mark_repeated(parsed.bindings));
        rest = parsed.rest;
        if !progressed {
            break;
        }
    }
    (bindings, rest)
}

impl Shr for Parser {
    type Output = Parser;

    fn shr(self, rhs: Parser) -> Parser {
        self.then(rhs)
    }
}

impl BitOr for Parser {
    type Output = Parser;

    fn bitor(self, rhs: Parser) -> Parser {
        self.or(rhs)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
