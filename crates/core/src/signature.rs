//! Explicit parameter lists.
//!
//! A [`Signature`] maps parameter names to parser-construction options and
//! builds the conventional parser for them: named parameters in any order,
//! followed by positional parameters in declaration order.

use serde_json::Value;

use crate::convert::Converter;
use crate::nonpositional::Nonpositional;
use crate::parser::Parser;
use crate::primitives::defaults;
use crate::surface::{Argument, Flag, Opt};

#[derive(Debug, Clone)]
enum ParamKind {
    Flag,
    Value(Converter),
    Positional(Converter),
    Custom(Parser),
}

/// One parameter of a [`Signature`].
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    kind: ParamKind,
    default: Option<Value>,
    short: Option<char>,
    help: Option<String>,
    many: bool,
}

impl Param {
    fn with_kind(name: &str, kind: ParamKind) -> Self {
        Param {
            name: name.to_owned(),
            kind,
            default: None,
            short: None,
            help: None,
            many: false,
        }
    }

    /// Boolean parameter. Without a default the flag is required; with
    /// default `false` it is `--name`; with default `true` it is
    /// `--no-name`, binding `false`, and any short alias is dropped.
    pub fn flag(name: &str) -> Self {
        Param::with_kind(name, ParamKind::Flag)
    }

    /// Value parameter, spelled `-n VALUE` / `--name VALUE`.
    pub fn value(name: &str, convert: impl Into<Converter>) -> Self {
        Param::with_kind(name, ParamKind::Value(convert.into()))
    }

    /// Positional parameter. With a default it may be omitted.
    pub fn positional(name: &str, convert: impl Into<Converter>) -> Self {
        Param::with_kind(name, ParamKind::Positional(convert.into()))
    }

    /// Parameter matched by an arbitrary parser.
    pub fn custom(name: &str, parser: Parser) -> Self {
        Param::with_kind(name, ParamKind::Custom(parser))
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn short(mut self, c: char) -> Self {
        self.short = Some(c);
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_owned());
        self
    }

    /// Accept the parameter any number of times (at least once unless a
    /// default is given); repeated values bind as a list.
    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_positional(&self) -> bool {
        matches!(self.kind, ParamKind::Positional(_))
    }

    pub fn parser(&self) -> Parser {
        // with `many` the default applies to the whole repetition instead
        let single_default = if self.many { None } else { self.default.clone() };
        let once = match &self.kind {
            ParamKind::Flag => {
                let mut flag = Flag::new(&self.name);
                if self.default == Some(Value::Bool(true)) {
                    flag = flag.spelling(&format!("--no-{}", self.name)).value(false);
                } else if let Some(c) = self.short {
                    flag = flag.short(c);
                }
                match single_default {
                    Some(value) => flag.default(value),
                    None => flag,
                }
                .parser()
            }
            ParamKind::Value(convert) => {
                let mut opt = Opt::new(&self.name).convert(convert.clone());
                if let Some(c) = self.short {
                    opt = opt.short(c);
                }
                match single_default {
                    Some(value) => opt.default(value),
                    None => opt,
                }
                .parser()
            }
            ParamKind::Positional(convert) => Argument::new(&self.name)
                .convert(convert.clone())
                .parser(),
            ParamKind::Custom(parser) => parser.clone(),
        };
        // flags and options carry a single default themselves
        let builds_default = matches!(self.kind, ParamKind::Flag | ParamKind::Value(_));
        let p = match (self.many, &self.default) {
            (false, Some(value)) if !builds_default => once | self.fallback(value),
            (false, _) => once,
            (true, None) => once.many1(),
            (true, Some(value)) => once.many1() | self.fallback(value),
        };
        match &self.help {
            Some(text) => p.help(&self.name, text),
            None => p,
        }
    }

    fn fallback(&self, value: &Value) -> Parser {
        defaults([(self.name.clone(), value.clone())])
    }
}

/// Ordered parameter list plus an optional parser accepted anywhere.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
    repeated: Option<Parser>,
}

impl Signature {
    pub fn new() -> Self {
        Signature::default()
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Accept `p` anywhere among the named parameters.
    pub fn repeated(mut self, p: Parser) -> Self {
        self.repeated = Some(p);
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn parser(&self) -> Parser {
        let named = self
            .params
            .iter()
            .filter(|p| !p.is_positional())
            .map(Param::parser);
        let mut group = Nonpositional::new(named);
        if let Some(r) = &self.repeated {
            group = group.repeated(r.clone());
        }
        self.params
            .iter()
            .filter(|p| p.is_positional())
            .fold(group.parser(), |acc, p| acc >> p.parser())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ValueType;
    use crate::error::ParseError;
    use crate::parser::Invocation;
    use crate::surface::flag;
    use serde_json::json;

    #[test]
    fn defaults_and_usage() {
        let sig = Signature::new()
            .param(Param::value("x", ValueType::Int))
            .param(Param::flag("dev").default(false))
            .param(Param::flag("prod").default(false));
        let p = sig.parser();
        assert_eq!(p.usage().render(), "-x X [--dev] [--prod]");
        let args = p.parse_args(&["-x", "1", "--dev"]).unwrap().parsed().unwrap();
        assert_eq!(
            args.into_value(),
            json!({"x": 1, "dev": true, "prod": false})
        );
    }

    #[test]
    fn true_default_becomes_negated_flag() {
        let p = Signature::new()
            .param(Param::flag("t").default(true))
            .parser();
        let args = p.parse_args(&["--no-t"]).unwrap().parsed().unwrap();
        assert_eq!(args["t"], json!(false));
        let args = p.parse_args::<&str>(&[]).unwrap().parsed().unwrap();
        assert_eq!(args["t"], json!(true));
    }

    #[test]
    fn custom_parser_and_help_lines() {
        let p = Signature::new()
            .param(Param::value("x", ValueType::Int).help("the base"))
            .param(Param::value("y", ValueType::Int).help("the exponent"))
            .param(Param::custom("kwargs", (flag("verbose") | flag("quiet")).optional()))
            .parser();
        assert_eq!(
            p.parse_args(&["-h"]).unwrap(),
            Invocation::Help(
                "usage: -x X -y Y [--verbose | --quiet]\nx: the base\ny: the exponent".to_owned()
            )
        );
        let args = p
            .parse_args(&["--quiet", "-y", "2", "-x", "1"])
            .unwrap()
            .parsed()
            .unwrap();
        assert_eq!(args.into_value(), json!({"quiet": true, "y": 2, "x": 1}));
    }

    #[test]
    fn positionals_follow_named_block() {
        let p = Signature::new()
            .param(Param::positional("y", ValueType::Int))
            .param(Param::value("x", ValueType::Int).short('e'))
            .parser();
        assert_eq!(p.usage().render(), "-x X Y");
        let args = p.parse_args(&["-e", "0", "1"]).unwrap().parsed().unwrap();
        assert_eq!(args.into_value(), json!({"x": 0, "y": 1}));
    }

    #[test]
    fn negated_flag_drops_short_alias() {
        let p = Signature::new()
            .param(Param::flag("color").short('c').default(true))
            .parser();
        assert_eq!(p.usage().render(), "[--no-color]");
        let err = p.parse_args(&["-c"]).unwrap_err();
        assert_eq!(err.error, ParseError::unexpected("end of input", "-c"));
        let args = p.parse_args(&["--no-color"]).unwrap().parsed().unwrap();
        assert_eq!(args["color"], json!(false));
    }

    #[test]
    fn positional_default_makes_it_optional() {
        let p = Signature::new()
            .param(Param::value("x", ValueType::Int))
            .param(Param::positional("y", ValueType::Int).default(3))
            .parser();
        assert_eq!(p.usage().render(), "-x X [Y]");
        let args = p.parse_args(&["-x", "1"]).unwrap().parsed().unwrap();
        assert_eq!(args.into_value(), json!({"x": 1, "y": 3}));
        let args = p.parse_args(&["-x", "1", "7"]).unwrap().parsed().unwrap();
        assert_eq!(args.into_value(), json!({"x": 1, "y": 7}));
    }

    #[test]
    fn custom_param_default_applies_when_unmatched() {
        let p = Signature::new()
            .param(Param::custom("mode", flag("fast") | flag("slow")).default("auto"))
            .parser();
        let args = p.parse_args::<&str>(&[]).unwrap().parsed().unwrap();
        assert_eq!(args.into_value(), json!({"mode": "auto"}));
        let args = p.parse_args(&["--slow"]).unwrap().parsed().unwrap();
        assert_eq!(args.into_value(), json!({"slow": true}));
    }

    #[test]
    fn many_param_collects_list() {
        let p = Signature::new()
            .param(Param::flag("verbose").many().default(false))
            .param(Param::value("x", ValueType::Int))
            .parser();
        let err = p
            .parse_args(&["--verbose", "-x", "1", "--verbose"])
            .unwrap_err();
        // the repetition is one member of the group, so it cannot straddle -x
        assert_eq!(err.error, ParseError::unexpected("end of input", "--verbose"));
        let args = p
            .parse_args(&["-x", "1", "--verbose", "--verbose"])
            .unwrap()
            .parsed()
            .unwrap();
        assert_eq!(args["verbose"], json!([true, true]));
        let args = p.parse_args(&["-x", "1"]).unwrap().parsed().unwrap();
        assert_eq!(args["verbose"], json!(false));
    }
}
