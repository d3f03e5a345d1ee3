//! Fathom CLI binary.
//!
//! Provides a command-line interface for the Fathom valuation engine.

mod commands;
mod error;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use fathom_inputs::Mode;
use logging::{LogFormat, init_logging};

#[derive(Parser)]
#[command(name = "fathom")]
#[command(about = "Fathom: three-statement projections and valuation", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Terminal tables.
    #[default]
    Text,
    /// Markdown.
    Markdown,
    /// Pretty JSON.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Project the statements and value the business
    Run {
        /// Request file (JSON), or `-` for stdin
        #[arg(long, short)]
        input: PathBuf,

        /// Override the request's mode
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,

        /// Number of years to project
        #[arg(long, default_value = "5")]
        years: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Include the full statements
        #[arg(long)]
        statements: bool,

        /// Continue when inputs fail validation
        #[arg(long)]
        lenient: bool,

        /// Also write a JSON report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show the input schema for a mode
    Schema {
        /// Mode to describe
        #[arg(long, value_parser = parse_mode, default_value = "founder")]
        mode: Mode,
    },

    /// Analyse comparable companies only
    Comps {
        /// Peers file (JSON array, or an object with `comparableCompanies`)
        #[arg(long, short)]
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    value.parse().map_err(|err: fathom_inputs::UnknownModeError| err.to_string())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Run {
            input,
            mode,
            years,
            format,
            statements,
            lenient,
            report,
        } => commands::run_model(&commands::RunOptions {
            input,
            mode,
            years,
            format,
            statements,
            lenient,
            report,
        })?,
        Commands::Schema { mode } => commands::print_schema(mode),
        Commands::Comps { input, format } => commands::run_comps(&input, format)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "fathom", "run", "--input", "model.json", "--mode", "Investor", "--years", "7",
            "--format", "json", "--lenient",
        ])
        .unwrap();

        let Commands::Run {
            mode,
            years,
            format,
            lenient,
            statements,
            ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(mode, Some(Mode::Investor));
        assert_eq!(years, 7);
        assert_eq!(format, OutputFormat::Json);
        assert!(lenient);
        assert!(!statements);
    }

    #[test]
    fn test_unknown_mode_rejected_at_cli() {
        assert!(Cli::try_parse_from(["fathom", "schema", "--mode", "analyst"]).is_err());
    }
}
