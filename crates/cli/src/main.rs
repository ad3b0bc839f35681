mod commands;
mod settings;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use hrforms_engine::DsaPolicy;
use rust_decimal::Decimal;

use crate::settings::Settings;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Document kinds `draft` can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DraftKind {
    Claim,
    Adjustment,
}

/// Reactive field rules for HR travel forms.
#[derive(Parser)]
#[command(name = "hrforms", version, about = "Reactive field rules for HR travel forms")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Settings file with [engine] and [frappe] tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an edit script against a document
    Replay {
        /// Path to the script JSON file
        script: PathBuf,
        /// Collaborator fixtures JSON file
        #[arg(long, conflicts_with = "remote")]
        fixtures: Option<PathBuf>,
        /// Answer lookups from the configured Frappe site
        #[arg(long)]
        remote: bool,
    },

    /// Draft a claim or adjustment from a Travel Authorization
    Draft {
        /// Path to the authorization document JSON file
        authorization: PathBuf,
        /// Kind of document to draft
        #[arg(long, value_enum)]
        kind: DraftKind,
        /// Daily subsistence allowance (required for claims)
        #[arg(long)]
        dsa: Option<Decimal>,
        /// Percentage of the allowance paid on the return day
        #[arg(long)]
        return_day_percent: Option<Decimal>,
    },

    /// Prepare a document for saving and report what blocks it
    Validate {
        /// Path to the document JSON file
        document: PathBuf,
        /// Daily subsistence allowance; recomputes an authorization's estimate
        #[arg(long)]
        dsa: Option<Decimal>,
        /// Percentage of the allowance paid on the return day
        #[arg(long, requires = "dsa")]
        return_day_percent: Option<Decimal>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "error" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(s) => s,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Replay {
            script,
            fixtures,
            remote,
        } => {
            commands::replay::cmd_replay(
                &script,
                fixtures.as_deref(),
                remote,
                &settings,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Draft {
            authorization,
            kind,
            dsa,
            return_day_percent,
        } => {
            commands::draft::cmd_draft(
                &authorization,
                kind,
                dsa,
                return_day_percent,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Validate {
            document,
            dsa,
            return_day_percent,
        } => {
            let policy = dsa.map(|dsa| DsaPolicy {
                dsa,
                return_day_percent,
            });
            commands::validate::cmd_validate(&document, policy, &settings, cli.output, cli.quiet);
        }
    }
}

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
