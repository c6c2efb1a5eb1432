use std::path::Path;
use std::process;

use combarg_core::{Args, Invocation};
use serde_json::{Map, Value};

use crate::command_file::Selected;
use crate::commands::load_tree;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_parse(
    file: &Path,
    defaults: Option<&Path>,
    args: &[String],
    output: OutputFormat,
    quiet: bool,
) {
    let tree = load_tree(file, output, quiet);

    let fallback = match defaults.map(read_defaults).transpose() {
        Ok(fallback) => fallback.unwrap_or_default(),
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    match tree.run(args) {
        Ok(Invocation::Help(text)) => match output {
            OutputFormat::Text => println!("{}", text),
            OutputFormat::Json => println!("{}", serde_json::json!({ "help": text })),
        },
        Ok(Invocation::Parsed(selected)) => {
            let mut merged = selected.args.into_map();
            merge_defaults(&mut merged, fallback);
            print_selected(
                &Selected {
                    command: selected.command,
                    args: Args::from(merged),
                },
                output,
            );
        }
        Err(e) => {
            tracing::debug!(error = ?e.error, "parse failed");
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

fn read_defaults(path: &Path) -> Result<Map<String, Value>, String> {
    let src = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading file '{}': {}", path.display(), e))?;
    match serde_json::from_str(&src) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(format!(
            "defaults file '{}' must contain a JSON object",
            path.display()
        )),
        Err(e) => Err(format!("error parsing JSON in '{}': {}", path.display(), e)),
    }
}

/// Fill keys missing from `parsed` with `fallback`. Parsed values win;
/// nested tables merge key by key.
fn merge_defaults(parsed: &mut Map<String, Value>, fallback: Map<String, Value>) {
    for (key, value) in fallback {
        match parsed.get_mut(&key) {
            None => {
                parsed.insert(key, value);
            }
            Some(Value::Object(inner)) => {
                if let Value::Object(more) = value {
                    merge_defaults(inner, more);
                }
            }
            Some(_) => {}
        }
    }
}

fn print_selected(selected: &Selected, output: OutputFormat) {
    match output {
        OutputFormat::Text => {
            println!("{}", selected.command);
            for (key, value) in selected.args.as_map() {
                println!("  {} = {}", key, value);
            }
        }
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(selected)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
    }
}
