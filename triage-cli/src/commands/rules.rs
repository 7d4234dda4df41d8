//! Rules command - list, inspect and change routing rules

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use tokio_util::sync::CancellationToken;
use triage_core::domain::{Consequent, Rule, RuleId, RuleType};
use triage_core::ports::MessageKey;
use triage_core::services::{RuleForm, RuleList, RuleService};
use triage_core::{Error, OperationResult, TriageContext};

use super::rule_file::RuleFile;
use super::validate::print_form_problems;
use super::{get_context, parse_rule_type};
use crate::output::{self, create_table, spinner, status_badge};

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List rules of one type in evaluation order
    List {
        /// Rule type (assignment, priority)
        #[arg(long = "type", short = 't', default_value = "assignment")]
        rule_type: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one rule with its conditions and pending errors
    Show {
        id: RuleId,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a rule from a JSON rule file (or stdin)
    Create {
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace a rule's name, conditions and consequent from a rule file
    Update {
        id: RuleId,
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a rule; later rules move up
    Delete {
        id: RuleId,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Turn a rule on or off
    Toggle {
        id: RuleId,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move the rule at position FROM to position TO (1-based)
    Reorder {
        /// Rule type (assignment, priority)
        #[arg(long = "type", short = 't', default_value = "assignment")]
        rule_type: String,
        from: u32,
        to: u32,
        /// Save without asking
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(command: RulesCommands) -> Result<()> {
    match command {
        RulesCommands::List { rule_type, json } => list(parse_rule_type(&rule_type)?, json).await,
        RulesCommands::Show { id, json } => show(id, json).await,
        RulesCommands::Create { file, json } => create(file, json).await,
        RulesCommands::Update { id, file, json } => update(id, file, json).await,
        RulesCommands::Delete { id, force, json } => delete(id, force, json).await,
        RulesCommands::Toggle { id, json } => toggle(id, json).await,
        RulesCommands::Reorder {
            rule_type,
            from,
            to,
            yes,
            json,
        } => reorder(parse_rule_type(&rule_type)?, from, to, yes, json).await,
    }
}

async fn load_list(service: &RuleService, rule_type: RuleType, json: bool) -> Result<RuleList> {
    let bar = spinner("Loading rules...", json);
    let list = service.load_list(rule_type, &CancellationToken::new()).await;
    bar.finish_and_clear();
    Ok(list?)
}

/// The list that holds rule `id`
async fn list_of(ctx: &TriageContext, id: RuleId, json: bool) -> Result<RuleList> {
    let rule = ctx
        .rule_service
        .get_rule(id, &CancellationToken::new())
        .await?;
    load_list(&ctx.rule_service, rule.rule_type, json).await
}

fn consequent_text(ctx: &TriageContext, consequent: &Consequent) -> String {
    match consequent {
        Consequent::Group { group } => format!("team {}", group),
        Consequent::GroupWithBotAgent { group, agent } => format!("team {} / bot {}", group, agent),
        Consequent::Priority { priority } => ctx
            .messages
            .text(&MessageKey::Priority(*priority))
            .to_lowercase(),
    }
}

fn print_rules(ctx: &TriageContext, rows: &[(u32, &Rule)]) {
    let mut table = create_table();
    table.set_header(vec!["#", "ID", "Name", "Status", "Match", "Conditions", "Then", ""]);
    for (position, rule) in rows {
        table.add_row(vec![
            position.to_string(),
            rule.id.to_string(),
            rule.name.clone(),
            status_badge(rule.status),
            format!("{:?}", rule.conditional.match_policy).to_lowercase(),
            rule.conditional.conditions.len().to_string(),
            consequent_text(ctx, &rule.conditional.consequent),
            if rule.has_error() {
                "!".red().to_string()
            } else {
                String::new()
            },
        ]);
    }
    println!("{}", table);
}

async fn list(rule_type: RuleType, json: bool) -> Result<()> {
    let ctx = get_context(json)?;
    let list = load_list(&ctx.rule_service, rule_type, json).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(list.rules())?);
        return Ok(());
    }
    if list.is_empty() {
        println!(
            "No {} rules. Create one with 'triage rules create <file>'.",
            rule_type.as_str().to_lowercase()
        );
        return Ok(());
    }

    print_rules(&ctx, &list.in_draft_order());
    let flagged = list.rules().iter().filter(|r| r.has_error()).count();
    if flagged > 0 {
        output::warning(&format!(
            "{} rule(s) need attention. Run 'triage rules show <id>' for details.",
            flagged
        ));
    }
    Ok(())
}

async fn show(id: RuleId, json: bool) -> Result<()> {
    let ctx = get_context(json)?;
    let bar = spinner("Loading rule...", json);
    let catalog = ctx.load_catalog().await;
    let editor = match catalog {
        Ok(catalog) => {
            ctx.rule_service
                .open_editor(id, catalog, &CancellationToken::new())
                .await
        }
        Err(e) => Err(e),
    };
    bar.finish_and_clear();
    let editor = editor?;
    let view = editor.form.view(ctx.messages.as_ref())?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "form": view,
                "group": editor.group,
                "agent": editor.agent,
            }))?
        );
        return Ok(());
    }

    println!("{} {}", view.name.bold(), format!("#{}", id).dimmed());
    for condition in &view.conditions {
        let key = condition
            .key_name
            .clone()
            .or_else(|| condition.key.clone())
            .unwrap_or_default();
        let operator = condition
            .operator_label
            .clone()
            .unwrap_or_else(|| condition.operator.as_str().to_lowercase());
        let value = condition.value.clone().unwrap_or_default();
        println!("  {} {} {} {}", condition.prefix.cyan(), key, operator, value);
    }
    let target = match (&editor.group, &editor.agent) {
        (Some(group), Some(agent)) => format!("team {} / {}", group.name, agent.display_name),
        (Some(group), None) => format!("team {}", group.name),
        _ => view
            .consequent
            .priority
            .map(|p| ctx.messages.text(&MessageKey::Priority(p)))
            .unwrap_or_else(|| "-".to_string()),
    };
    println!("  {} {}", "then".cyan(), target);
    print_form_problems(&view);
    Ok(())
}

async fn create(file: Option<PathBuf>, json: bool) -> Result<()> {
    let rule_file = RuleFile::read(file.as_deref())?;
    let ctx = get_context(json)?;
    let catalog = ctx.load_catalog().await?;
    let mut list = load_list(&ctx.rule_service, rule_file.rule_type, json).await?;
    let mut form = ctx.rule_service.new_form(&list, catalog)?;
    rule_file.apply(&mut form)?;

    submit(&ctx, &mut form, &mut list, json).await
}

async fn update(id: RuleId, file: Option<PathBuf>, json: bool) -> Result<()> {
    let rule_file = RuleFile::read(file.as_deref())?;
    let ctx = get_context(json)?;
    let catalog = ctx.load_catalog().await?;
    let mut list = list_of(&ctx, id, json).await?;
    let mut editor = ctx
        .rule_service
        .open_editor(id, catalog, &CancellationToken::new())
        .await?;
    rule_file.apply(&mut editor.form)?;

    if !editor.form.is_dirty() {
        output::info("No changes to save.");
        return Ok(());
    }
    submit(&ctx, &mut editor.form, &mut list, json).await
}

async fn submit(
    ctx: &TriageContext,
    form: &mut RuleForm,
    list: &mut RuleList,
    json: bool,
) -> Result<()> {
    if !form.validate()?.is_valid() {
        let view = form.view(ctx.messages.as_ref())?;
        if json {
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            print_form_problems(&view);
        }
        anyhow::bail!("The rule has errors; nothing was saved.");
    }

    let bar = spinner("Saving rule...", json);
    let result = ctx.rule_service.submit(form, list).await;
    bar.finish_and_clear();

    match result {
        Ok(rule) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&OperationResult::ok(rule))?);
            }
            Ok(())
        }
        Err(Error::ServerValidation(payload)) => {
            if json {
                let rejected: triage_core::domain::result::Result<Rule> =
                    Err(Error::ServerValidation(payload));
                let envelope = OperationResult::from(rejected);
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                print_form_problems(&form.view(ctx.messages.as_ref())?);
            }
            anyhow::bail!("The server rejected the rule.");
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete(id: RuleId, force: bool, json: bool) -> Result<()> {
    let ctx = get_context(json)?;
    let mut list = list_of(&ctx, id, json).await?;
    let name = list.get(id).map(|r| r.name.clone()).unwrap_or_default();

    if !force
        && !json
        && !Confirm::new()
            .with_prompt(format!("Delete rule '{}'?", name))
            .default(false)
            .interact()?
    {
        println!("{}", "Cancelled".dimmed());
        return Ok(());
    }

    ctx.rule_service.delete_rule(&mut list, id).await?;
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    }
    Ok(())
}

async fn toggle(id: RuleId, json: bool) -> Result<()> {
    let ctx = get_context(json)?;
    let mut list = list_of(&ctx, id, json).await?;
    let rule = ctx.rule_service.toggle_status(&mut list, id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rule)?);
    } else {
        println!("{} is now {}", rule.name, status_badge(rule.status));
    }
    Ok(())
}

async fn reorder(rule_type: RuleType, from: u32, to: u32, yes: bool, json: bool) -> Result<()> {
    let ctx = get_context(json)?;
    let mut list = load_list(&ctx.rule_service, rule_type, json).await?;
    list.move_rule(from, to)?;

    if !list.is_order_dirty() {
        output::info("Order unchanged.");
        return Ok(());
    }

    if !json {
        print_rules(&ctx, &list.in_draft_order());
        if !yes
            && !Confirm::new()
                .with_prompt("Save this order?")
                .default(true)
                .interact()?
        {
            list.cancel_order();
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    ctx.rule_service.save_order(&mut list).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&list.order_payload())?);
    }
    Ok(())
}
