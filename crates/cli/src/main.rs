mod command_file;
mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use commands::parse::cmd_parse;
use commands::usage::cmd_usage;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Parse command lines against a declared command tree.
#[derive(Parser)]
#[command(
    name = "combarg",
    version,
    about = "Parse command lines against a declared command tree"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log parser decisions to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse ARGS against the commands declared in a command file
    Parse {
        /// Path to the command file (.toml, or JSON otherwise)
        file: PathBuf,
        /// JSON object of fallback values for keys the command line omits
        #[arg(long)]
        defaults: Option<PathBuf>,
        /// Tokens to parse, given after `--`
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the usage line and help text of a command file
    Usage {
        /// Path to the command file (.toml, or JSON otherwise)
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Parse {
            file,
            defaults,
            args,
        } => {
            cmd_parse(&file, defaults.as_deref(), &args, cli.output, cli.quiet);
        }
        Commands::Usage { file } => {
            cmd_usage(&file, cli.output, cli.quiet);
        }
    }
}

/// Report an error message respecting output format and quiet flag.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
