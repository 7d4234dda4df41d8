//! Catalog command - show the condition keys rules can use

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use triage_core::services::{EntryKind, KeySource};

use super::get_context;
use crate::output::{create_table, spinner};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyRow {
    key: String,
    name: String,
    #[serde(rename = "type")]
    condition_type: String,
    source: &'static str,
    options: Vec<String>,
}

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context(json)?;
    let bar = spinner("Loading custom fields...", json);
    let catalog = ctx.load_catalog().await;
    bar.finish_and_clear();
    let catalog = catalog?;

    if json {
        let rows: Vec<KeyRow> = catalog
            .selectable_entries()
            .filter_map(|entry| {
                let condition_type = entry.condition_type()?;
                Some(KeyRow {
                    key: entry.key.clone(),
                    name: entry.name.clone(),
                    condition_type: condition_type.as_str().to_string(),
                    source: match entry.source {
                        KeySource::System(_) => "system",
                        KeySource::CustomField(_) => "customField",
                    },
                    options: entry.options.clone(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["Key", "Name", "Type", "Options"]);
    for entry in catalog.entries() {
        match entry.kind {
            EntryKind::Header => {
                table.add_row(vec![String::new(), entry.name.bold().to_string(), String::new(), String::new()]);
            }
            EntryKind::Key(condition_type) => {
                table.add_row(vec![
                    entry.key.clone(),
                    entry.name.clone(),
                    condition_type.as_str().to_lowercase(),
                    entry.options.join(", "),
                ]);
            }
        }
    }
    println!("{}", table);
    Ok(())
}
