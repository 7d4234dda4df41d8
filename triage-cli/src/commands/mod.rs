//! CLI command implementations

pub mod catalog;
pub mod demo;
pub mod logs;
pub mod rule_file;
pub mod rules;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use triage_core::domain::RuleType;
use triage_core::services::{EntryPoint, LogEvent, LoggingService};
use triage_core::TriageContext;

use crate::output::ConsoleNotifier;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let triage_dir = get_triage_dir().ok()?;
    std::fs::create_dir_all(&triage_dir).ok()?;
    LoggingService::new(&triage_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        l.record(event);
    }
}

/// Get the triage directory from `TRIAGE_DIR` or `~/.triage`
pub fn get_triage_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TRIAGE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".triage"))
        .context("Could not find home directory; set TRIAGE_DIR")
}

/// Get or create the triage context
pub fn get_context(json: bool) -> Result<TriageContext> {
    let triage_dir = get_triage_dir()?;
    TriageContext::new(
        &triage_dir,
        Arc::new(ConsoleNotifier::new(json)),
        EntryPoint::Cli,
    )
    .context("Failed to initialize triage context")
}

/// Parse a `--type` argument
pub fn parse_rule_type(value: &str) -> Result<RuleType> {
    RuleType::parse(value)
        .with_context(|| format!("Unknown rule type '{}' (expected assignment or priority)", value))
}
