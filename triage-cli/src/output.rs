//! Output formatting utilities

use std::time::Duration;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use triage_core::domain::{Notification, NotificationLevel, Recovery, RuleStatus};
use triage_core::ports::Notifier;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Colored ON/OFF badge
pub fn status_badge(status: RuleStatus) -> String {
    match status {
        RuleStatus::On => "ON".green().to_string(),
        RuleStatus::Off => "OFF".dimmed().to_string(),
    }
}

/// Spinner on stderr while a request is in flight; hidden when stderr is not a terminal
pub fn spinner(message: &str, json: bool) -> ProgressBar {
    if json || atty::isnt(atty::Stream::Stderr) {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Prints engine notifications as they arrive.
///
/// Quiet in `--json` mode so stdout stays machine-readable.
pub struct ConsoleNotifier {
    quiet: bool,
}

impl ConsoleNotifier {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        if self.quiet {
            return;
        }
        match notification.level {
            NotificationLevel::Success => success(&format!("✓ {}", notification.message)),
            NotificationLevel::Error => {
                let hint = match notification.recovery {
                    Some(Recovery::Retry) => " Run the command again to retry.",
                    _ => "",
                };
                error(&format!("✗ {}{}", notification.message, hint));
            }
        }
    }
}
