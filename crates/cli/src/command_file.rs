//! Command files: a serde description of a command tree.
//!
//! ```toml
//! ignore_prefixes = ["--config-"]
//! ignore_option_prefixes = ["--set-"]
//!
//! [[commands]]
//! name = "app"
//! handler = false
//!
//! [[commands.params]]
//! name = "verbose"
//! type = "bool"
//! default = false
//!
//! [[commands.commands]]
//! name = "deploy"
//! subcommand = true
//! ```

use std::collections::HashSet;
use std::path::Path;

use combarg_core::{
    Args, Command, CommandTree, Flag, NodeId, Opt, Param, Parser, Signature, Usage, ValueType,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum CommandFileError {
    #[error("error reading file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("error parsing TOML in '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("error parsing JSON in '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid command '{command}': {reason}")]
    Invalid { command: String, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CommandFile {
    /// Tokens starting with any of these are accepted anywhere and ignored.
    #[serde(default)]
    pub ignore_prefixes: Vec<String>,
    /// Like `ignore_prefixes`, but the matching token also swallows the
    /// token after it.
    #[serde(default)]
    pub ignore_option_prefixes: Vec<String>,
    pub commands: Vec<CommandDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CommandDecl {
    pub name: String,
    /// Must be introduced by its name as a literal token.
    #[serde(default)]
    pub subcommand: bool,
    /// Whether the command can be selected on its own.
    #[serde(default = "default_true")]
    pub handler: bool,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub commands: Vec<CommandDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ParamDecl {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ValueType,
    #[serde(default)]
    pub positional: bool,
    #[serde(default)]
    pub many: bool,
    pub default: Option<Value>,
    pub short: Option<char>,
    pub help: Option<String>,
}

fn default_true() -> bool {
    true
}

/// What a successful parse selects: the command path and its arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Selected {
    pub command: String,
    pub args: Args,
}

impl CommandFile {
    pub(crate) fn load(path: &Path) -> Result<CommandFile, CommandFileError> {
        let display = path.display().to_string();
        let src = std::fs::read_to_string(path).map_err(|source| CommandFileError::Io {
            path: display.clone(),
            source,
        })?;
        let file = if path.extension().is_some_and(|e| e == "toml") {
            toml::from_str(&src).map_err(|source| CommandFileError::Toml {
                path: display,
                source,
            })?
        } else {
            serde_json::from_str(&src).map_err(|source| CommandFileError::Json {
                path: display,
                source,
            })?
        };
        Ok(file)
    }

    /// Build the command tree. Each command's handler reports its own path.
    pub(crate) fn build(&self) -> Result<CommandTree<Selected>, CommandFileError> {
        let ignored = self.ignored();
        let mut tree = CommandTree::new();
        for decl in &self.commands {
            add(&mut tree, None, decl, &[], ignored.as_ref())?;
        }
        tracing::debug!(roots = self.commands.len(), "command tree built");
        Ok(tree)
    }

    fn ignored(&self) -> Option<Parser> {
        let options = self.ignore_option_prefixes.iter().map(|prefix| {
            let owned = prefix.clone();
            let label = format!("{prefix}*");
            Opt::matching(&label, move |t| t.starts_with(owned.as_str()))
                .parser()
                .ignore()
                .with_usage(Usage::Option {
                    spelling: label,
                    meta: "VALUE".to_owned(),
                })
        });
        let flags = self.ignore_prefixes.iter().map(|prefix| {
            let owned = prefix.clone();
            Flag::matching(&format!("{prefix}*"), move |t| t.starts_with(owned.as_str()))
                .parser()
                .ignore()
        });
        options.chain(flags).reduce(|acc, p| acc | p)
    }
}

fn add(
    tree: &mut CommandTree<Selected>,
    parent: Option<NodeId>,
    decl: &CommandDecl,
    path: &[String],
    ignored: Option<&Parser>,
) -> Result<NodeId, CommandFileError> {
    let invalid = |reason: String| CommandFileError::Invalid {
        command: decl.name.clone(),
        reason,
    };
    if decl.name.is_empty() {
        return Err(invalid("command name is empty".to_owned()));
    }
    if !decl.handler && decl.commands.is_empty() {
        return Err(invalid("command has neither a handler nor subcommands".to_owned()));
    }

    let mut seen = HashSet::new();
    let mut signature = Signature::new();
    for param in &decl.params {
        if !seen.insert(param.name.as_str()) {
            return Err(invalid(format!("parameter '{}' declared twice", param.name)));
        }
        signature = signature.param(param.build().map_err(invalid)?);
    }
    if let Some(p) = ignored {
        signature = signature.repeated(p.clone());
    }

    let mut path = path.to_vec();
    path.push(decl.name.clone());
    let mut command = if decl.subcommand {
        Command::subcommand(&decl.name, signature.parser())
    } else {
        Command::new(&decl.name, signature.parser())
    };
    if decl.handler {
        let selected = path.join(" ");
        command = command.handler(move |args: &Args| Selected {
            command: selected.clone(),
            args: args.clone(),
        });
    }

    let id = tree.add(parent, command);
    for child in &decl.commands {
        add(tree, Some(id), child, &path, ignored)?;
    }
    Ok(id)
}

impl ParamDecl {
    fn build(&self) -> Result<Param, String> {
        if self.name.is_empty() {
            return Err("parameter name is empty".to_owned());
        }
        if let Some(default) = &self.default {
            if !self.default_fits(default) {
                let expected = if self.many {
                    format!("{} or a list of {}", self.kind, self.kind)
                } else {
                    self.kind.to_string()
                };
                return Err(format!(
                    "default for '{}' must be {}, got {}",
                    self.name, expected, default
                ));
            }
        }
        let mut param = match (self.positional, self.kind) {
            (true, kind) => {
                if self.short.is_some() {
                    return Err(format!("positional '{}' cannot have a short alias", self.name));
                }
                Param::positional(&self.name, kind)
            }
            (false, ValueType::Bool) => Param::flag(&self.name),
            (false, kind) => Param::value(&self.name, kind),
        };
        if let Some(default) = &self.default {
            param = param.default(default.clone());
        }
        if let Some(c) = self.short {
            param = param.short(c);
        }
        if let Some(text) = &self.help {
            param = param.help(text);
        }
        if self.many {
            param = param.many();
        }
        Ok(param)
    }

    /// A repeated parameter may default to a list of values.
    fn default_fits(&self, default: &Value) -> bool {
        match default {
            Value::Array(items) if self.many => items.iter().all(|v| self.kind.accepts(v)),
            other => self.kind.accepts(other),
        }
    }
}
