//! Command trees.
//!
//! A [`CommandTree`] is an arena of [`Command`] nodes. Each node owns a parser
//! fragment; a node's effective parser is its fragment followed by the
//! alternation of its children's effective parsers, with a fallback to the
//! node itself when it has a handler. Dispatch runs the same evaluation but
//! remembers which node produced the winning parse.

use std::fmt;

use crate::args::{Args, Bindings};
use crate::error::{ParseError, UsageError};
use crate::parser::{help_requested, owned, Invocation, Parser};
use crate::primitives::{done, literal};
use crate::usage::Usage;

type Handler<R> = Box<dyn Fn(&Args) -> R>;

/// Index of a node in the [`CommandTree`] that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// How a node is selected among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    /// Chosen by whichever sibling parser succeeds first.
    Alternative,
    /// Requires its name as a literal token before its fragment.
    Subcommand,
}

/// One handler in the tree.
pub struct Command<R> {
    name: String,
    kind: ChildKind,
    fragment: Parser,
    handler: Option<Handler<R>>,
}

impl<R> Command<R> {
    pub fn new(name: &str, fragment: Parser) -> Self {
        Command {
            name: name.to_owned(),
            kind: ChildKind::Alternative,
            fragment,
            handler: None,
        }
    }

    /// Like [`Command::new`], but the node only matches after the literal
    /// token `name`.
    pub fn subcommand(name: &str, fragment: Parser) -> Self {
        Command {
            kind: ChildKind::Subcommand,
            ..Command::new(name, fragment)
        }
    }

    pub fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Args) -> R + 'static,
    {
        self.handler = Some(Box::new(f));
        self
    }
}

impl<R> fmt::Debug for Command<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("fragment", &self.fragment)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

struct Node<R> {
    command: Command<R>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The node selected by a successful dispatch, with the bindings gathered
/// along its root-to-node path.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub node: NodeId,
    pub args: Args,
}

struct Selected<'a> {
    node: NodeId,
    bindings: Bindings,
    rest: &'a [String],
}

/// Failures of a set of siblings. A subcommand whose name was the next token
/// is the one the user asked for, so its failure is reported over the
/// others'.
struct Failures {
    named: Option<ParseError>,
    others: ParseError,
}

impl Failures {
    fn new() -> Self {
        Failures {
            named: None,
            others: ParseError::EmptyAlternative,
        }
    }

    fn record(&mut self, named: bool, error: ParseError) {
        if named {
            self.named = Some(match self.named.take() {
                Some(earlier) => earlier.merge(error),
                None => error,
            });
        } else {
            let earlier = std::mem::replace(&mut self.others, ParseError::EmptyAlternative);
            self.others = earlier.merge(error);
        }
    }

    fn into_error(self) -> ParseError {
        self.named.unwrap_or(self.others)
    }
}

fn names_next(name: Option<&str>, input: &[String]) -> bool {
    match (name, input.first()) {
        (Some(name), Some(token)) => name == token,
        _ => false,
    }
}

pub struct CommandTree<R> {
    nodes: Vec<Node<R>>,
    roots: Vec<NodeId>,
}

impl<R> Default for CommandTree<R> {
    fn default() -> Self {
        CommandTree {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }
}

impl<R> fmt::Debug for CommandTree<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTree")
            .field("nodes", &self.nodes.len())
            .field("usage", &self.usage())
            .finish()
    }
}

impl<R> CommandTree<R> {
    pub fn new() -> Self {
        CommandTree::default()
    }

    /// Append `command` under `parent`, or as a new root. Children are tried
    /// in the order they are added.
    pub fn add(&mut self, parent: Option<NodeId>, command: Command<R>) -> NodeId {
        let id = NodeId(self.nodes.len());
        match parent {
            Some(p) => self.node_mut(p).children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.push(Node {
            command,
            parent,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> &Node<R> {
        self.nodes
            .get(id.0)
            .unwrap_or_else(|| panic!("node {} does not belong to this command tree", id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<R> {
        self.nodes
            .get_mut(id.0)
            .unwrap_or_else(|| panic!("node {} does not belong to this command tree", id.0))
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).command.name
    }

    pub fn kind(&self, id: NodeId) -> ChildKind {
        self.node(id).command.kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Names from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current);
            names.push(node.command.name.as_str());
            cursor = node.parent;
        }
        names.reverse();
        names
    }

    // ── Effective parser ─────────────────────────────────────────────

    /// Name token of a subcommand node.
    fn literal_name(&self, id: NodeId) -> Option<&str> {
        let command = &self.node(id).command;
        match command.kind {
            ChildKind::Subcommand => Some(command.name.as_str()),
            ChildKind::Alternative => None,
        }
    }

    /// `|` over the siblings, except that a subcommand named by the next
    /// token decides the failure.
    fn alternatives(&self, ids: &[NodeId]) -> Parser {
        let branches: Vec<(Option<String>, Parser)> = ids
            .iter()
            .map(|&id| (self.literal_name(id).map(str::to_owned), self.effective(id)))
            .collect();
        let usage = branches
            .iter()
            .fold(Usage::Never, |acc, (_, p)| Usage::alt(acc, p.usage().clone()));
        Parser::new(usage, move |input| {
            let mut failures = Failures::new();
            for (name, p) in &branches {
                match p.parse(input) {
                    Ok(parsed) => return Ok(parsed),
                    Err(e) => failures.record(names_next(name.as_deref(), input), e),
                }
            }
            Err(failures.into_error())
        })
    }

    fn effective(&self, id: NodeId) -> Parser {
        let node = self.node(id);
        let head = match node.command.kind {
            ChildKind::Subcommand => literal(&node.command.name) >> node.command.fragment.clone(),
            ChildKind::Alternative => node.command.fragment.clone(),
        };
        let tail = match (node.children.is_empty(), node.command.handler.is_some()) {
            (true, true) => Parser::empty(),
            (true, false) => Parser::zero(),
            (false, true) => self.alternatives(&node.children) | Parser::empty(),
            (false, false) => self.alternatives(&node.children),
        };
        head >> tail
    }

    /// The parser accepted by the whole tree.
    pub fn parser(&self) -> Parser {
        self.alternatives(&self.roots)
    }

    pub fn usage(&self) -> String {
        self.parser().usage().render()
    }

    pub fn help_text(&self) -> String {
        self.parser().help_text()
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Mirror of `effective` that also reports the winning node.
    fn select<'a>(&self, id: NodeId, input: &'a [String]) -> Result<Selected<'a>, ParseError> {
        let node = self.node(id);
        let mut rest = input;
        if node.command.kind == ChildKind::Subcommand {
            rest = literal(&node.command.name).parse(rest)?.rest;
        }
        let own = node.command.fragment.parse(rest)?;

        match self.select_among(&node.children, own.rest) {
            Ok(mut selected) => {
                let mut bindings = own.bindings;
                bindings.append(&mut selected.bindings);
                selected.bindings = bindings;
                Ok(selected)
            }
            Err(_) if node.command.handler.is_some() => Ok(Selected {
                node: id,
                bindings: own.bindings,
                rest: own.rest,
            }),
            Err(e) => Err(e),
        }
    }

    /// Mirror of `alternatives`.
    fn select_among<'a>(
        &self,
        ids: &[NodeId],
        input: &'a [String],
    ) -> Result<Selected<'a>, ParseError> {
        let mut failures = Failures::new();
        for &id in ids {
            match self.select(id, input) {
                Ok(selected) => return Ok(selected),
                Err(e) => failures.record(names_next(self.literal_name(id), input), e),
            }
        }
        Err(failures.into_error())
    }

    /// Parse `tokens` and report which node they select.
    pub fn dispatch<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> Result<Invocation<Dispatch>, UsageError> {
        if help_requested(tokens) {
            tracing::debug!("help requested");
            return Ok(Invocation::Help(self.help_text()));
        }
        let tokens = owned(tokens);
        let fail = |error| UsageError::new(self.usage(), error);
        let selected = self.select_among(&self.roots, &tokens).map_err(fail)?;
        done().parse(selected.rest).map_err(fail)?;
        tracing::debug!(
            command = %self.path(selected.node).join(" "),
            bindings = selected.bindings.len(),
            "dispatch selected"
        );
        Ok(Invocation::Parsed(Dispatch {
            node: selected.node,
            args: Args::from_bindings(&selected.bindings),
        }))
    }

    /// Dispatch and invoke the selected node's handler.
    pub fn run<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Invocation<R>, UsageError> {
        match self.dispatch(tokens)? {
            Invocation::Help(text) => Ok(Invocation::Help(text)),
            Invocation::Parsed(Dispatch { node, args }) => match &self.node(node).command.handler {
                Some(handler) => Ok(Invocation::Parsed(handler(&args))),
                None => Err(UsageError::new(self.usage(), ParseError::EmptyAlternative)),
            },
        }
    }
}
