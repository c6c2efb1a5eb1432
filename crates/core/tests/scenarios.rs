//! End-to-end scenarios: whole parsers from tokens to results or rendered
//! failures.

use combarg_core::{
    flag, interleave, nonpositional, Args, Argument, Command, CommandTree, Flag, Invocation,
    Nonpositional, Opt, Param, ParseError, Parser, Signature, ValueType,
};
use serde_json::json;

fn x_or_ys() -> (Parser, Parser) {
    let x = Opt::new("x").convert(ValueType::Int).parser();
    let y = Argument::new("y").convert(ValueType::Float).parser();
    (x, y)
}

fn parsed(p: &Parser, tokens: &[&str]) -> serde_json::Value {
    p.parse_args(tokens)
        .unwrap()
        .parsed()
        .expect("not a help request")
        .into_value()
}

// ── Option or repeated argument ──────────────────────────────────────

#[test]
fn option_or_many_arguments() {
    let (x, y) = x_or_ys();
    let p = x | y.many();
    assert_eq!(p.usage().render(), "[-x X | [Y ...]]");
    assert_eq!(parsed(&p, &["-x", "1"]), json!({"x": 1}));
    assert_eq!(parsed(&p, &["1", "2", "3"]), json!({"y": [1.0, 2.0, 3.0]}));
    assert_eq!(parsed(&p, &[]), json!({}));
}

#[test]
fn option_or_many1_arguments_cites_both() {
    let (x, y) = x_or_ys();
    let p = x | y.many1();
    let err = p.parse_args::<&str>(&[]).unwrap_err();
    assert_eq!(
        err.error,
        ParseError::MissingRequired {
            names: vec!["-x".into(), "y".into()]
        }
    );
    assert_eq!(
        err.to_string(),
        "usage: [-x X | Y [Y ...]]\nThe following arguments are required: -x, y."
    );
}

#[test]
fn conversion_failure_is_reported() {
    let p = Opt::new("x").convert(ValueType::Int).parser();
    let err = p.parse_args(&["-x", "1.5"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "usage: -x X\nInvalid value '1.5' for -x: invalid digit found in string."
    );
}

// ── Order-free groups ────────────────────────────────────────────────

#[test]
fn flags_in_any_order_with_ignored_config() {
    let config = Flag::matching("--config-*", |t| t.starts_with("--config-"))
        .parser()
        .ignore();
    let p = Nonpositional::new([
        Flag::new("verbose").default(false).parser(),
        Opt::new("level").convert(ValueType::Int).default(0).parser(),
    ])
    .repeated(config)
    .parser();
    assert_eq!(
        parsed(&p, &["--config-a", "--level", "3", "--config-b", "--verbose"]),
        json!({"level": 3, "verbose": true})
    );
    assert_eq!(parsed(&p, &[]), json!({"verbose": false, "level": 0}));
}

#[test]
fn interleaved_flags_around_positionals() {
    let p = interleave(
        flag("verbose"),
        [Argument::new("src").parser(), Argument::new("dst").parser()],
    );
    assert_eq!(
        p.usage().render(),
        "[--verbose ...] SRC [--verbose ...] DST [--verbose ...]"
    );
    assert_eq!(
        parsed(&p, &["a", "--verbose", "b"]),
        json!({"src": "a", "verbose": true, "dst": "b"})
    );
}

#[test]
fn nonpositional_reports_leftovers() {
    let p = nonpositional([flag("a"), flag("b")]);
    let err = p.parse_args(&["-b", "-a", "-a"]).unwrap_err();
    assert_eq!(err.error, ParseError::unexpected("end of input", "-a"));
}

// ── Help ─────────────────────────────────────────────────────────────

#[test]
fn help_lists_documented_keys() {
    let p = Signature::new()
        .param(Param::value("x", ValueType::Int).help("the base"))
        .param(Param::value("y", ValueType::Int).help("the exponent"))
        .param(Param::flag("verbose").default(false))
        .parser();
    assert_eq!(
        p.parse_args(&["-x", "1", "--help"]).unwrap(),
        Invocation::Help(
            "usage: -x X -y Y [--verbose]\nx: the base\ny: the exponent".to_owned()
        )
    );
}

// ── Dispatch ─────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Ran {
    Deploy(Args),
    Status(Args),
}

fn deploy_tree() -> CommandTree<Ran> {
    let mut tree = CommandTree::new();
    let app = tree.add(
        None,
        Command::new("app", Flag::new("verbose").short('v').default(false).parser()),
    );
    tree.add(
        Some(app),
        Command::subcommand(
            "deploy",
            Signature::new()
                .param(Param::value("env", ValueType::String))
                .param(Param::flag("force").default(false))
                .parser(),
        )
        .handler(|args: &Args| Ran::Deploy(args.clone())),
    );
    tree.add(
        Some(app),
        Command::subcommand("status", Parser::empty())
            .handler(|args: &Args| Ran::Status(args.clone())),
    );
    tree
}

#[test]
fn dispatch_runs_selected_subcommand() {
    let tree = deploy_tree();
    assert_eq!(
        tree.usage(),
        "[--verbose] [deploy --env ENV [--force] | status]"
    );
    let Invocation::Parsed(Ran::Deploy(args)) = tree
        .run(&["-v", "deploy", "--force", "--env", "prod"])
        .unwrap()
    else {
        panic!("expected deploy");
    };
    assert_eq!(
        args.into_value(),
        json!({"verbose": true, "force": true, "env": "prod"})
    );
    let Invocation::Parsed(Ran::Status(args)) = tree.run(&["status"]).unwrap() else {
        panic!("expected status");
    };
    assert_eq!(args.into_value(), json!({"verbose": false}));
}

#[test]
fn dispatch_without_subcommand_fails() {
    let tree = deploy_tree();
    let err = tree.run::<&str>(&[]).unwrap_err();
    assert_eq!(
        err.error,
        ParseError::MissingRequired {
            names: vec!["deploy".into(), "status".into()]
        }
    );
    let err = tree.run(&["launch"]).unwrap_err();
    assert_eq!(err.error, ParseError::unexpected("deploy", "launch"));
}

#[test]
fn named_subcommand_reports_its_own_failure() {
    let tree = deploy_tree();
    let err = tree.run(&["deploy"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "usage: [--verbose] [deploy --env ENV [--force] | status]\n\
         The following arguments are required: --env."
    );
    let err = tree.run(&["-v", "status", "--force"]).unwrap_err();
    assert_eq!(err.error, ParseError::unexpected("end of input", "--force"));
}
