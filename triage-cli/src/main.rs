//! Triage CLI - help desk routing rules in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use triage_core::services::LogEvent;

mod commands;
mod output;

use commands::{catalog, demo, get_logger, log_event, logs, rules, validate};

/// Triage - manage ticket assignment and priority rules
#[derive(Parser)]
#[command(name = "triage", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List, create, edit, toggle and reorder rules
    Rules {
        #[command(subcommand)]
        command: rules::RulesCommands,
    },

    /// Show the condition keys available to rules
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a rule file without saving it
    Validate {
        /// Path to the rule file (stdin if omitted)
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Rules { command } => match command {
                rules::RulesCommands::List { .. } => "rules list",
                rules::RulesCommands::Show { .. } => "rules show",
                rules::RulesCommands::Create { .. } => "rules create",
                rules::RulesCommands::Update { .. } => "rules update",
                rules::RulesCommands::Delete { .. } => "rules delete",
                rules::RulesCommands::Toggle { .. } => "rules toggle",
                rules::RulesCommands::Reorder { .. } => "rules reorder",
            },
            Commands::Catalog { .. } => "catalog",
            Commands::Validate { .. } => "validate",
            Commands::Logs { .. } => "logs",
            Commands::Demo { .. } => "demo",
        }
    }
}

/// Diagnostics go to stderr; `TRIAGE_LOG` takes the usual filter syntax
fn init_tracing() {
    let filter = EnvFilter::try_from_env("TRIAGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let logger = get_logger();
    let command_name = cli.command.name();
    log_event(&logger, LogEvent::new("cli_command").with_command(command_name));
    tracing::debug!(command = command_name, "running command");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("cli_error")
                    .with_command(command_name)
                    .with_error(e.to_string())
                    .with_error_details(format!("{:#}", e)),
            );
            output::error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Rules { command } => rules::run(command).await,
        Commands::Catalog { json } => catalog::run(json).await,
        Commands::Validate { file, json } => validate::run(file, json).await,
        Commands::Logs { command } => logs::run(command),
        Commands::Demo { command } => demo::run(command),
    }
}
