//! Surface parsers: flags, options and positional arguments.
//!
//! Each is a small builder that produces a [`Parser`] binding one key.
//! `flag`, `option` and `argument` are shortcuts for the common case.

use std::sync::Arc;

use serde_json::Value;

use crate::args::Binding;
use crate::convert::Converter;
use crate::error::ParseError;
use crate::parser::Parser;
use crate::primitives::{defaults, item, sat};
use crate::usage::{placeholder, Usage};

type Matcher = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Conventional spelling: `-x` for one-character names, `--name` otherwise.
pub fn spelling(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{name}")
    } else {
        format!("--{name}")
    }
}

/// Which tokens introduce a flag or option.
#[derive(Clone)]
enum Spelling {
    Exact(Vec<String>),
    /// Any token matching the predicate; `label` is shown in usage.
    Matching { label: String, matcher: Matcher },
}

impl Spelling {
    fn label(&self) -> String {
        match self {
            Spelling::Exact(accepted) => accepted[0].clone(),
            Spelling::Matching { label, .. } => label.clone(),
        }
    }

    fn usage(&self) -> Usage {
        match self {
            Spelling::Exact(accepted) => Usage::Literal(accepted[0].clone()),
            Spelling::Matching { label, .. } => Usage::Pattern(label.clone()),
        }
    }

    /// Parser for the introducing token, bound to `key`.
    fn parser(&self, key: &str) -> Parser {
        let label = self.label();
        match self.clone() {
            Spelling::Exact(accepted) => {
                sat(key, &label, move |t| accepted.iter().any(|a| a == t))
            }
            Spelling::Matching { matcher, .. } => sat(key, &label, move |t| matcher(t)),
        }
    }
}

/// Key bound by a flag matched by predicate: the token without leading dashes.
fn matched_key(token: &Value) -> String {
    token
        .as_str()
        .map(|t| t.trim_start_matches('-').to_owned())
        .unwrap_or_default()
}

// ── Flag ─────────────────────────────────────────────────────────────

/// A literal token that binds a fixed value (`true` unless overridden).
#[derive(Clone)]
pub struct Flag {
    name: String,
    spelling: Spelling,
    value: Value,
    default: Option<Value>,
    help: Option<String>,
}

impl Flag {
    pub fn new(name: &str) -> Self {
        Flag {
            name: name.to_owned(),
            spelling: Spelling::Exact(vec![spelling(name)]),
            value: Value::Bool(true),
            default: None,
            help: None,
        }
    }

    /// Accept any token satisfying `matcher`; the binding key is the token
    /// with its leading dashes removed. `label` is shown in usage.
    pub fn matching<F>(label: &str, matcher: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Flag {
            name: label.to_owned(),
            spelling: Spelling::Matching {
                label: label.to_owned(),
                matcher: Arc::new(matcher),
            },
            value: Value::Bool(true),
            default: None,
            help: None,
        }
    }

    /// Replace the primary spelling, e.g. `--no-cache`.
    pub fn spelling(mut self, spelling: &str) -> Self {
        if let Spelling::Exact(accepted) = &mut self.spelling {
            accepted[0] = spelling.to_owned();
        }
        self
    }

    /// Also accept `-c`.
    pub fn short(mut self, c: char) -> Self {
        if let Spelling::Exact(accepted) = &mut self.spelling {
            accepted.push(format!("-{c}"));
        }
        self
    }

    /// Value bound when the flag is present.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Value bound when the flag is absent; makes the flag optional.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_owned());
        self
    }

    pub fn parser(&self) -> Parser {
        let key = self.name.clone();
        let value = self.value.clone();
        let by_pattern = matches!(self.spelling, Spelling::Matching { .. });
        let matched = self
            .spelling
            .parser(&key)
            .bind(move |bindings| {
                let bound = if by_pattern {
                    bindings
                        .first()
                        .map(|b| matched_key(&b.value))
                        .unwrap_or_else(|| key.clone())
                } else {
                    key.clone()
                };
                Parser::ret(vec![Binding::new(bound, value.clone())])
            })
            .with_usage(self.spelling.usage());
        finish(matched, &self.name, self.default.clone(), self.help.as_deref())
    }
}

impl From<Flag> for Parser {
    fn from(flag: Flag) -> Parser {
        flag.parser()
    }
}

pub fn flag(name: &str) -> Parser {
    Flag::new(name).parser()
}

// ── Opt ──────────────────────────────────────────────────────────────

/// A literal token followed by a value: `-x 1`, `--name value`.
#[derive(Clone)]
pub struct Opt {
    name: String,
    spelling: Spelling,
    convert: Converter,
    default: Option<Value>,
    help: Option<String>,
}

impl Opt {
    pub fn new(name: &str) -> Self {
        Opt {
            name: name.to_owned(),
            spelling: Spelling::Exact(vec![spelling(name)]),
            convert: Converter::default(),
            default: None,
            help: None,
        }
    }

    /// Accept any introducing token satisfying `matcher`; the binding key is
    /// that token with its leading dashes removed.
    pub fn matching<F>(label: &str, matcher: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Opt {
            name: label.to_owned(),
            spelling: Spelling::Matching {
                label: label.to_owned(),
                matcher: Arc::new(matcher),
            },
            convert: Converter::default(),
            default: None,
            help: None,
        }
    }

    pub fn spelling(mut self, spelling: &str) -> Self {
        if let Spelling::Exact(accepted) = &mut self.spelling {
            accepted[0] = spelling.to_owned();
        }
        self
    }

    pub fn short(mut self, c: char) -> Self {
        if let Spelling::Exact(accepted) = &mut self.spelling {
            accepted.push(format!("-{c}"));
        }
        self
    }

    pub fn convert(mut self, convert: impl Into<Converter>) -> Self {
        self.convert = convert.into();
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_owned());
        self
    }

    pub fn parser(&self) -> Parser {
        let key = self.name.clone();
        let meta = placeholder(&self.name);
        let label = self.spelling.label();
        let convert = self.convert.clone();
        let by_pattern = matches!(self.spelling, Spelling::Matching { .. });
        let value_key = meta.clone();
        let matched = self
            .spelling
            .parser(&key)
            .bind(move |bindings| {
                let bound = if by_pattern {
                    bindings
                        .first()
                        .map(|b| matched_key(&b.value))
                        .unwrap_or_else(|| key.clone())
                } else {
                    key.clone()
                };
                converted(item(&value_key), bound, label.clone(), convert.clone())
            })
            .with_usage(Usage::Option {
                spelling: self.spelling.label(),
                meta,
            });
        finish(matched, &self.name, self.default.clone(), self.help.as_deref())
    }
}

impl From<Opt> for Parser {
    fn from(opt: Opt) -> Parser {
        opt.parser()
    }
}

pub fn option(name: &str) -> Parser {
    Opt::new(name).parser()
}

// ── Argument ─────────────────────────────────────────────────────────

/// A positional value bound to `key` without any introducing token.
#[derive(Clone)]
pub struct Argument {
    key: String,
    convert: Converter,
    help: Option<String>,
}

impl Argument {
    pub fn new(key: &str) -> Self {
        Argument {
            key: key.to_owned(),
            convert: Converter::default(),
            help: None,
        }
    }

    pub fn convert(mut self, convert: impl Into<Converter>) -> Self {
        self.convert = convert.into();
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_owned());
        self
    }

    pub fn parser(&self) -> Parser {
        let usage = Usage::Argument(placeholder(&self.key));
        let p = converted(
            item(&self.key),
            self.key.clone(),
            self.key.clone(),
            self.convert.clone(),
        )
        .with_usage(usage);
        finish(p, &self.key, None, self.help.as_deref())
    }
}

impl From<Argument> for Parser {
    fn from(argument: Argument) -> Parser {
        argument.parser()
    }
}

pub fn argument(key: &str) -> Parser {
    Argument::new(key).parser()
}

// ── Shared ───────────────────────────────────────────────────────────

/// Run `raw` (a one-token parser), convert its token and bind it to `key`.
/// Conversion failures are reported under `name`.
fn converted(raw: Parser, key: String, name: String, convert: Converter) -> Parser {
    let usage = raw.usage().clone();
    raw.bind(move |bindings| {
        let token = bindings
            .first()
            .and_then(|b| b.value.as_str())
            .unwrap_or_default()
            .to_owned();
        match convert.apply(&token) {
            Ok(value) => Parser::ret(vec![Binding::new(key.clone(), value)]),
            Err(reason) => Parser::fail(ParseError::conversion(name.clone(), token, reason)),
        }
    })
    .with_usage(usage)
}

/// Apply a default (optional with substituted value) and a help line.
fn finish(p: Parser, key: &str, default: Option<Value>, help: Option<&str>) -> Parser {
    let p = match default {
        Some(value) => p | defaults([(key.to_owned(), value)]),
        None => p,
    };
    match help {
        Some(text) => p.help(key, text),
        None => p,
    }
}
