//! combarg-core: command-line parsing from composable parser combinators.
//!
//! A [`Parser`] is an immutable value wrapping a function from a token list
//! to bindings plus the unconsumed remainder. Larger parsers are built with
//! `>>` (sequence), `|` (alternation), `+` (either order) and the
//! repetition and permutation combinators. Every parser carries a [`Usage`]
//! tree built alongside it, so usage and help text always describe exactly
//! the input the parser accepts.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`Parser`] -- the parser monad; [`Parser::parse_args`] is the entry point
//! - [`flag`], [`option`], [`argument`] and their builders [`Flag`], [`Opt`],
//!   [`Argument`] -- surface parsers
//! - [`nonpositional`], [`interleave`] -- order-free composition
//! - [`Args`] -- nested result mapping built from dotted keys
//! - [`ParseError`], [`UsageError`] -- failure taxonomy and its rendering
//! - [`Signature`], [`Param`] -- parameter lists built into a parser
//! - [`CommandTree`], [`Command`] -- handler hierarchies and dispatch

pub mod args;
pub mod convert;
pub mod error;
pub mod nonpositional;
pub mod parser;
pub mod primitives;
pub mod signature;
pub mod surface;
pub mod tree;
pub mod usage;

// ── Convenience re-exports: engine ───────────────────────────────────

pub use args::{Args, Binding, Bindings, NESTING_SEPARATOR};
pub use error::{ParseError, UsageError};
pub use parser::{Invocation, ParseResult, Parsed, Parser, HELP_TOKENS};
pub use usage::Usage;

// ── Convenience re-exports: building blocks ──────────────────────────

pub use convert::{Converter, ValueType};
pub use nonpositional::{interleave, nonpositional, Nonpositional};
pub use primitives::{defaults, done, item, literal, sat};
pub use surface::{argument, flag, option, Argument, Flag, Opt};

// ── Convenience re-exports: commands ─────────────────────────────────

pub use signature::{Param, Signature};
pub use tree::{ChildKind, Command, CommandTree, Dispatch, NodeId};
