//! Usage synthesis.
//!
//! Every combinator builds a [`Usage`] node alongside its run function, so
//! the usage line is derived from the same structure that accepts input and
//! is never written by hand.

/// Structural description of what a parser accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Usage {
    /// Consumes nothing (`ret`).
    Empty,
    /// Never succeeds (`zero`). Dropped from alternations.
    Never,
    /// An exact token: a flag spelling or a subcommand name.
    Literal(String),
    /// A token class accepted by predicate, e.g. `--config-*`.
    Pattern(String),
    /// A flag spelling followed by a value placeholder.
    Option { spelling: String, meta: String },
    /// A positional value placeholder.
    Argument(String),
    Seq(Vec<Usage>),
    Alt(Vec<Usage>),
    Optional(Box<Usage>),
    Many(Box<Usage>),
    Many1(Box<Usage>),
    /// A fragment carrying a help line for `key`.
    Described {
        usage: Box<Usage>,
        key: String,
        help: String,
    },
}

impl Usage {
    pub fn seq(left: Usage, right: Usage) -> Usage {
        if left == Usage::Never || right == Usage::Never {
            return Usage::Never;
        }
        let mut items = Vec::new();
        for part in [left, right] {
            match part {
                Usage::Empty => {}
                Usage::Seq(inner) => items.extend(inner),
                other => items.push(other),
            }
        }
        match items.len() {
            0 => Usage::Empty,
            1 => items.remove(0),
            _ => Usage::Seq(items),
        }
    }

    pub fn alt(left: Usage, right: Usage) -> Usage {
        match (left, right) {
            (Usage::Never, other) | (other, Usage::Never) => other,
            (Usage::Empty, Usage::Empty) => Usage::Empty,
            (Usage::Empty, other) | (other, Usage::Empty) => Usage::optional(other),
            // the left side always succeeds, so the right is unreachable
            (left @ (Usage::Optional(_) | Usage::Many(_)), _) => left,
            (left, Usage::Optional(right)) => Usage::optional(Usage::alt(left, *right)),
            (left, right) => {
                let mut items = Vec::new();
                for part in [left, right] {
                    match part {
                        Usage::Alt(inner) => items.extend(inner),
                        other => items.push(other),
                    }
                }
                Usage::Alt(items)
            }
        }
    }

    pub fn optional(usage: Usage) -> Usage {
        match usage {
            Usage::Empty | Usage::Never => Usage::Empty,
            u @ (Usage::Optional(_) | Usage::Many(_)) => u,
            other => Usage::Optional(Box::new(other)),
        }
    }

    pub fn many(usage: Usage) -> Usage {
        match usage {
            Usage::Empty | Usage::Never => Usage::Empty,
            other => Usage::Many(Box::new(other)),
        }
    }

    pub fn many1(usage: Usage) -> Usage {
        match usage {
            Usage::Empty | Usage::Never => usage,
            other => Usage::Many1(Box::new(other)),
        }
    }

    pub fn described(usage: Usage, key: impl Into<String>, help: impl Into<String>) -> Usage {
        Usage::Described {
            usage: Box::new(usage),
            key: key.into(),
            help: help.into(),
        }
    }

    /// Render the usage line (without the `usage:` prefix).
    pub fn render(&self) -> String {
        match self {
            Usage::Empty | Usage::Never => String::new(),
            Usage::Literal(s) | Usage::Pattern(s) | Usage::Argument(s) => s.clone(),
            Usage::Option { spelling, meta } => format!("{spelling} {meta}"),
            Usage::Seq(items) => items
                .iter()
                .map(Usage::render)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            Usage::Alt(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(Usage::render)
                    .collect::<Vec<_>>()
                    .join(" | ")
            ),
            Usage::Optional(inner) => match inner.as_ref() {
                Usage::Alt(_) => inner.render(),
                other => format!("[{}]", other.render()),
            },
            Usage::Many(inner) => format!("[{} ...]", inner.render()),
            Usage::Many1(inner) => {
                let once = inner.render();
                format!("{once} [{once} ...]")
            }
            Usage::Described { usage, .. } => usage.render(),
        }
    }

    /// `key: help` pairs in the order they appear in the usage line.
    pub fn help_lines(&self) -> Vec<(String, String)> {
        let mut lines = Vec::new();
        self.collect_help(&mut lines);
        lines
    }

    fn collect_help(&self, out: &mut Vec<(String, String)>) {
        match self {
            Usage::Described { usage, key, help } => {
                out.push((key.clone(), help.clone()));
                usage.collect_help(out);
            }
            Usage::Seq(items) | Usage::Alt(items) => {
                for item in items {
                    item.collect_help(out);
                }
            }
            Usage::Optional(inner) | Usage::Many(inner) | Usage::Many1(inner) => {
                inner.collect_help(out);
            }
            _ => {}
        }
    }

    /// Every exact token that appears in the rendered usage line.
    pub fn literals(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_literals(&mut out);
        out
    }

    fn collect_literals(&self, out: &mut Vec<String>) {
        match self {
            Usage::Literal(s) | Usage::Option { spelling: s, .. } => {
                if !out.contains(s) {
                    out.push(s.clone());
                }
            }
            Usage::Seq(items) | Usage::Alt(items) => {
                for item in items {
                    item.collect_literals(out);
                }
            }
            Usage::Optional(inner) | Usage::Many(inner) | Usage::Many1(inner) => {
                inner.collect_literals(out);
            }
            Usage::Described { usage, .. } => usage.collect_literals(out),
            _ => {}
        }
    }

    /// Full help text: the usage line followed by one line per documented key.
    pub fn help_text(&self) -> String {
        let mut text = format!("usage: {}", self.render());
        for (key, help) in self.help_lines() {
            text.push('\n');
            text.push_str(&format!("{key}: {help}"));
        }
        text
    }
}

/// Placeholder shown for a value-taking key: `x` → `X`, `a.b` → `A.B`.
pub fn placeholder(key: &str) -> String {
    key.to_uppercase()
}
