use std::path::Path;

use crate::commands::load_tree;
use crate::OutputFormat;

pub(crate) fn cmd_usage(file: &Path, output: OutputFormat, quiet: bool) {
    let tree = load_tree(file, output, quiet);
    match output {
        OutputFormat::Text => println!("{}", tree.help_text()),
        OutputFormat::Json => {
            let help: serde_json::Map<String, serde_json::Value> = tree
                .parser()
                .usage()
                .help_lines()
                .into_iter()
                .map(|(key, text)| (key, serde_json::Value::String(text)))
                .collect();
            let json = serde_json::json!({
                "usage": tree.usage(),
                "help": help,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }
}
