//! Primitive token parsers. Everything else is built from these and the
//! monad operations in [`crate::parser`].

use serde_json::Value;

use crate::args::Binding;
use crate::error::ParseError;
use crate::parser::{Parsed, Parser};
use crate::usage::{placeholder, Usage};

/// Consume one token unconditionally and bind it to `key`.
pub fn item(key: &str) -> Parser {
    let key = key.to_owned();
    Parser::new(Usage::Argument(placeholder(&key)), move |input| {
        match input.split_first() {
            Some((token, rest)) => Ok(Parsed {
                bindings: vec![Binding::new(key.clone(), token.clone())],
                rest,
            }),
            None => Err(ParseError::missing(key.clone())),
        }
    })
}

/// Consume one token if `predicate` holds, binding it to `key`.
///
/// `expected` names the accepted token in diagnostics and usage.
pub fn sat<P>(key: &str, expected: &str, predicate: P) -> Parser
where
    P: Fn(&str) -> bool + Send + Sync + 'static,
{
    let expected = expected.to_owned();
    let missing = expected.clone();
    let checked = item(key).bind(move |bindings| {
        let token = match bindings.first().map(|b| &b.value) {
            Some(Value::String(token)) => token.clone(),
            _ => String::new(),
        };
        if predicate(&token) {
            Parser::ret(bindings)
        } else {
            Parser::fail(ParseError::unexpected(expected.clone(), token))
        }
    });
    Parser::new(Usage::Pattern(missing.clone()), move |input| {
        if input.is_empty() {
            return Err(ParseError::missing(missing.clone()));
        }
        checked.parse(input)
    })
}

/// Match one exact token, binding nothing.
pub fn literal(token: &str) -> Parser {
    let wanted = token.to_owned();
    sat(token, token, move |t| t == wanted)
        .ignore()
        .with_usage(Usage::Literal(token.to_owned()))
}

/// Succeed, binding nothing, only at the end of input.
pub fn done() -> Parser {
    Parser::new(Usage::Empty, |input| match input.first() {
        None => Ok(Parsed {
            bindings: Vec::new(),
            rest: input,
        }),
        Some(token) => Err(ParseError::unexpected("end of input", token.clone())),
    })
}

/// Always succeed with fixed bindings, consuming nothing.
pub fn defaults<K, V, I>(pairs: I) -> Parser
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    Parser::ret(pairs.into_iter().map(|(k, v)| Binding::new(k, v)).collect())
}
