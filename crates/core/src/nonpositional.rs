//! Order-free composition.
//!
//! `nonpositional` matches every member exactly once, in any order. The
//! search walks permutations depth-first with an explicit stack, so its
//! depth is bounded by the number of members rather than by the number of
//! orders explored.

use std::ops::Add;

use crate::args::Bindings;
use crate::error::ParseError;
use crate::parser::{Parsed, ParseResult, Parser};
use crate::usage::Usage;

/// Builder for an order-free group, optionally interspersed with any number
/// of matches of a `repeated` parser.
#[derive(Debug, Clone, Default)]
pub struct Nonpositional {
    members: Vec<Parser>,
    repeated: Option<Parser>,
}

impl Nonpositional {
    pub fn new(members: impl IntoIterator<Item = Parser>) -> Self {
        Nonpositional {
            members: members.into_iter().collect(),
            repeated: None,
        }
    }

    /// Allow `p` before, between and after the members, any number of times.
    pub fn repeated(mut self, p: Parser) -> Self {
        self.repeated = Some(p.many());
        self
    }

    pub fn parser(self) -> Parser {
        let mut usage = self
            .members
            .iter()
            .fold(Usage::Empty, |acc, p| Usage::seq(acc, p.usage().clone()));
        if let Some(r) = &self.repeated {
            usage = Usage::seq(usage, r.usage().clone());
        }
        let Nonpositional { members, repeated } = self;
        Parser::new(usage, move |input| search(&members, repeated.as_ref(), input))
    }
}

/// Match all `members` in any order.
pub fn nonpositional(members: impl IntoIterator<Item = Parser>) -> Parser {
    Nonpositional::new(members).parser()
}

/// Interleave any number of `repeatable` matches around a fixed-order
/// sequence: `many(r) f1 many(r) f2 ... many(r)`.
pub fn interleave(repeatable: Parser, fixed: impl IntoIterator<Item = Parser>) -> Parser {
    let filler = repeatable.many();
    fixed
        .into_iter()
        .fold(filler.clone(), |acc, p| acc >> p >> filler.clone())
}

/// One partially matched order.
struct Frame<'a> {
    used: Vec<bool>,
    bindings: Bindings,
    rest: &'a [String],
    /// Next member index to try from this frame.
    next: usize,
    depth: usize,
}

fn skip_repeated<'a>(
    repeated: Option<&Parser>,
    bindings: &mut Bindings,
    rest: &'a [String],
) -> &'a [String] {
    match repeated.map(|r| r.parse(rest)) {
        Some(Ok(parsed)) => {
            bindings.extend(parsed.bindings);
            parsed.rest
        }
        _ => rest,
    }
}

/// Depth-first permutation search.
///
/// An order that consumes the whole remaining input wins immediately.
/// Otherwise the successful order that consumed the most input wins, ties
/// going to declaration order. With no successful order, the failures of
/// every attempted step merge in declaration order.
fn search<'a>(
    members: &[Parser],
    repeated: Option<&Parser>,
    input: &'a [String],
) -> ParseResult<'a> {
    let n = members.len();
    let mut bindings = Vec::new();
    let start = skip_repeated(repeated, &mut bindings, input);
    let mut stack = vec![Frame {
        used: vec![false; n],
        bindings,
        rest: start,
        next: 0,
        depth: 0,
    }];
    let mut best: Option<Parsed<'a>> = None;
    let mut error = ParseError::EmptyAlternative;
    let mut attempts = 0usize;

    while let Some(frame) = stack.last_mut() {
        if frame.depth == n {
            let Some(done) = stack.pop() else { break };
            if done.rest.is_empty() {
                tracing::trace!(attempts, "nonpositional: complete order found");
                return Ok(Parsed {
                    bindings: done.bindings,
                    rest: done.rest,
                });
            }
            let better = best
                .as_ref()
                .map_or(true, |b| done.rest.len() < b.rest.len());
            if better {
                best = Some(Parsed {
                    bindings: done.bindings,
                    rest: done.rest,
                });
            }
            continue;
        }

        let Some(i) = (frame.next..n).find(|&i| !frame.used[i]) else {
            stack.pop();
            continue;
        };
        frame.next = i + 1;
        attempts += 1;

        match members[i].parse(frame.rest) {
            Ok(parsed) => {
                let mut used = frame.used.clone();
                used[i] = true;
                let mut bindings = frame.bindings.clone();
                bindings.extend(parsed.bindings);
                let rest = skip_repeated(repeated, &mut bindings, parsed.rest);
                let depth = frame.depth + 1;
                stack.push(Frame {
                    used,
                    bindings,
                    rest,
                    next: 0,
                    depth,
                });
            }
            Err(e) => error = error.merge(e),
        }
    }

    tracing::trace!(attempts, found = best.is_some(), "nonpositional: search exhausted");
    best.ok_or(error)
}

/// `p + q` is `nonpositional([p, q])`.
impl Add for Parser {
    type Output = Parser;

    fn add(self, rhs: Parser) -> Parser {
        nonpositional([self, rhs])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Binding;
    use crate::convert::ValueType;
    use crate::surface::{argument, flag, option, Flag, Opt};
    use serde_json::json;

    fn keys(p: &Parser, items: &[&str]) -> Vec<String> {
        p.parse_bindings(items)
            .unwrap()
            .into_iter()
            .map(|b| b.key)
            .collect()
    }

    #[test]
    fn empty_group_consumes_nothing() {
        let p = nonpositional(Vec::new());
        assert!(p.parse_bindings::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn any_order_bindings_follow_input_order() {
        let p = nonpositional([flag("verbose"), flag("debug"), argument("a")]);
        assert_eq!(keys(&p, &["--debug", "hello", "--verbose"]), ["debug", "a", "verbose"]);
        assert_eq!(keys(&p, &["--verbose", "--debug", "x"]), ["verbose", "debug", "a"]);
    }

    #[test]
    fn defaults_do_not_steal_a_later_order() {
        let p = nonpositional([
            Flag::new("verbose").default(false).parser(),
            Flag::new("debug").default(false).parser(),
        ]);
        let bindings = p.parse_bindings(&["--debug", "--verbose"]).unwrap();
        assert_eq!(
            bindings,
            vec![Binding::new("debug", true), Binding::new("verbose", true)]
        );
        let bindings = p.parse_bindings::<&str>(&[]).unwrap();
        assert_eq!(
            bindings,
            vec![Binding::new("verbose", false), Binding::new("debug", false)]
        );
    }

    #[test]
    fn failure_prefers_literal_mismatch() {
        let p = nonpositional([flag("verbose"), flag("debug")]);
        // `--verbose` then end of input is only a missing error; the other
        // order mismatches a literal, which is more specific
        let err = p.parse_bindings(&["--verbose"]).unwrap_err();
        assert_eq!(err.error, ParseError::unexpected("--debug", "--verbose"));
        let err = p.parse_bindings(&["--verbose", "--typo"]).unwrap_err();
        assert_eq!(err.error, ParseError::unexpected("--debug", "--typo"));
        let err = p.parse_bindings::<&str>(&[]).unwrap_err();
        assert_eq!(
            err.error,
            ParseError::MissingRequired {
                names: vec!["--verbose".into(), "--debug".into()]
            }
        );
    }

    #[test]
    fn plus_is_binary_nonpositional() {
        let p = flag("verbose") + flag("quiet");
        assert_eq!(keys(&p, &["--quiet", "--verbose"]), ["quiet", "verbose"]);
        assert_eq!(p.usage().render(), "--verbose --quiet");
    }

    #[test]
    fn chained_plus_does_not_cover_all_orders() {
        let p = flag("verbose") + flag("quiet") + option("x");
        assert!(p.parse_bindings(&["--verbose", "-x", "1", "--quiet"]).is_err());
        let p = nonpositional([flag("verbose"), flag("quiet"), option("x")]);
        assert_eq!(keys(&p, &["--verbose", "-x", "1", "--quiet"]), ["verbose", "x", "quiet"]);
    }

    #[test]
    fn repeated_parser_is_accepted_anywhere_and_ignored() {
        let config = Flag::matching("--config-*", |t| t.starts_with("--config-"))
            .parser()
            .ignore();
        let p = Nonpositional::new([flag("x"), flag("y")])
            .repeated(config)
            .parser();
        assert_eq!(keys(&p, &["--config-baz", "-y", "--config-foz", "-x"]), ["y", "x"]);
        assert_eq!(keys(&p, &["-x", "-y", "--config-foo", "--config-bar"]), ["x", "y"]);
        assert_eq!(p.usage().render(), "-x -y [--config-* ...]");
    }

    #[test]
    fn interleave_mixes_repeatable_around_positionals() {
        let repeatable = flag("verbose")
            | flag("quiet")
            | Opt::new("num").convert(ValueType::Int).parser();
        let p = interleave(repeatable, [argument("a"), argument("b")]);
        let args = p
            .parse_args(&["first", "--verbose", "--quiet", "second", "--quiet"])
            .unwrap()
            .parsed()
            .unwrap();
        assert_eq!(args["a"], json!("first"));
        assert_eq!(args["b"], json!("second"));
        assert_eq!(args["quiet"], json!([true, true]));
        assert_eq!(args["verbose"], json!(true));
    }
}
