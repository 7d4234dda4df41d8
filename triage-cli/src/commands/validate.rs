//! Validate command - check a rule file against the condition catalog without saving

use std::path::PathBuf;
use std::process::exit;

use anyhow::Result;
use colored::Colorize;
use triage_core::services::FormView;

use super::get_context;
use super::rule_file::RuleFile;
use crate::output::{self, spinner};

/// Print every field error of a form view, one per line
pub fn print_form_problems(view: &FormView) {
    let mut problems = Vec::new();
    if let Some(error) = &view.name_error {
        problems.push(format!("name: {}", error));
    }
    if let Some(error) = &view.conditions_error {
        problems.push(format!("conditions: {}", error));
    }
    for (index, condition) in view.conditions.iter().enumerate() {
        let label = condition
            .key
            .as_deref()
            .map(|k| format!("condition {} ({})", index + 1, k))
            .unwrap_or_else(|| format!("condition {}", index + 1));
        for error in [
            &condition.key_error,
            &condition.operator_error,
            &condition.value_error,
        ]
        .into_iter()
        .flatten()
        {
            problems.push(format!("{}: {}", label, error));
        }
    }
    let consequent = &view.consequent;
    for (field, error) in [
        ("team", &consequent.group_error),
        ("bot", &consequent.agent_error),
        ("priority", &consequent.priority_error),
    ] {
        if let Some(error) = error {
            problems.push(format!("{}: {}", field, error));
        }
    }

    if problems.is_empty() {
        return;
    }
    println!();
    println!("{}", "Problems:".red().bold());
    for problem in problems {
        println!("  {} {}", "✗".red(), problem);
    }
}

pub async fn run(file: Option<PathBuf>, json: bool) -> Result<()> {
    let rule_file = RuleFile::read(file.as_deref())?;
    let ctx = get_context(json)?;

    let bar = spinner("Loading condition keys...", json);
    let catalog = ctx.load_catalog().await;
    bar.finish_and_clear();

    let form = rule_file.to_new_form(catalog?)?;
    let view = form.view(ctx.messages.as_ref())?;
    let valid = form.validate()?.is_valid();

    if json {
        let payload = if valid { Some(form.payload()?) } else { None };
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "valid": valid,
                "form": view,
                "payload": payload,
            }))?
        );
    } else if valid {
        output::success(&format!("✓ '{}' is valid", view.name.trim()));
    } else {
        print_form_problems(&view);
    }

    if !valid {
        exit(1);
    }
    Ok(())
}
