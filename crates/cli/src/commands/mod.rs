pub(crate) mod parse;
pub(crate) mod usage;

use std::path::Path;
use std::process;

use combarg_core::CommandTree;

use crate::command_file::{CommandFile, Selected};
use crate::{report_error, OutputFormat};

/// Load and build a command file, exiting with a report on failure.
pub(crate) fn load_tree(path: &Path, output: OutputFormat, quiet: bool) -> CommandTree<Selected> {
    match CommandFile::load(path).and_then(|file| file.build()) {
        Ok(tree) => tree,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}
