//! Rule files - JSON descriptions of a rule for `rules create`, `rules update` and `validate`
//!
//! ```json
//! {
//!   "type": "ASSIGNMENT",
//!   "name": "Enterprise billing",
//!   "match": "ALL",
//!   "conditions": [
//!     { "key": "ticket.customFields.plan", "operator": "IS", "value": "enterprise" }
//!   ],
//!   "consequent": { "type": "GROUP", "group": 2 }
//! }
//! ```

use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use triage_core::domain::{
    BotAgent, ConsequentType, GroupId, MatchPolicy, Operator, PriorityLevel, RuleType,
};
use triage_core::services::{KeyCatalog, RuleForm};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFile {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "match")]
    pub match_policy: MatchPolicy,
    #[serde(default)]
    pub conditions: Vec<ConditionEntry>,
    pub consequent: ConsequentEntry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionEntry {
    pub key: String,
    #[serde(default)]
    pub operator: Option<Operator>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsequentEntry {
    Group {
        #[serde(default)]
        group: Option<GroupId>,
    },
    GroupWithBotAgent {
        #[serde(default)]
        group: Option<GroupId>,
        /// `{"id": 501, "botType": "CUSTOM", "groupIds": [1]}`; subtype and teams are optional
        #[serde(default)]
        agent: Option<BotAgent>,
    },
    Priority {
        #[serde(default)]
        priority: Option<PriorityLevel>,
    },
}

impl ConsequentEntry {
    fn consequent_type(&self) -> ConsequentType {
        match self {
            ConsequentEntry::Group { .. } => ConsequentType::Group,
            ConsequentEntry::GroupWithBotAgent { .. } => ConsequentType::GroupWithBotAgent,
            ConsequentEntry::Priority { .. } => ConsequentType::Priority,
        }
    }
}

impl RuleFile {
    /// Read a rule file; `-` or no path reads stdin when it is piped
    pub fn read(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read {}", p.display()))?,
            _ => {
                if atty::is(atty::Stream::Stdin) {
                    anyhow::bail!("No rule file given. Pass a path or pipe JSON on stdin.");
                }
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                buffer
            }
        };
        serde_json::from_str(&content).context("Invalid rule file")
    }

    /// Replace the contents of `form` with this file, field by field
    pub fn apply(&self, form: &mut RuleForm) -> Result<()> {
        if form.rule_type() != self.rule_type {
            anyhow::bail!(
                "Rule file is a {} rule but the rule being edited is {}",
                self.rule_type.as_str().to_lowercase(),
                form.rule_type().as_str().to_lowercase()
            );
        }
        form.set_name(self.name.clone());
        form.set_match(self.match_policy);

        let existing: Vec<_> = form.conditions().iter().map(|c| c.id).collect();
        for id in existing {
            form.remove_condition(id)?;
        }
        for (index, entry) in self.conditions.iter().enumerate() {
            let row = index + 1;
            let id = form.add_condition()?;
            form.set_condition_key(id, &entry.key)
                .with_context(|| format!("Condition {}", row))?;
            if let Some(operator) = entry.operator {
                form.set_condition_operator(id, operator)
                    .with_context(|| format!("Condition {}", row))?;
            }
            if entry.value.is_some() && !form.conditions()[index].operator.is_valueless() {
                form.set_condition_value(id, entry.value.clone())
                    .with_context(|| format!("Condition {}", row))?;
            }
        }

        form.set_consequent_type(self.consequent.consequent_type())?;
        match &self.consequent {
            ConsequentEntry::Group { group } => {
                if let Some(group) = group {
                    form.set_group(*group)?;
                }
            }
            ConsequentEntry::GroupWithBotAgent { group, agent } => {
                if let Some(group) = group {
                    form.set_group(*group)?;
                }
                if let Some(agent) = agent {
                    form.set_agent(agent.clone())?;
                }
            }
            ConsequentEntry::Priority { priority } => {
                if let Some(priority) = priority {
                    form.set_priority(*priority)?;
                }
            }
        }
        Ok(())
    }

    /// A new-rule form filled from this file
    pub fn to_new_form(&self, catalog: Arc<KeyCatalog>) -> Result<RuleForm> {
        let mut form = RuleForm::new_rule(self.rule_type, catalog);
        self.apply(&mut form)?;
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::adapters::demo::demo_workspace;
    use triage_core::adapters::messages::EnglishMessages;

    fn catalog() -> Arc<KeyCatalog> {
        let data = demo_workspace();
        Arc::new(KeyCatalog::build(&data.ticket_fields, &data.customer_fields, &EnglishMessages))
    }

    #[test]
    fn test_valid_file_builds_valid_form() {
        let file: RuleFile = serde_json::from_str(
            r#"{
                "type": "ASSIGNMENT",
                "name": "VIP",
                "match": "ANY",
                "conditions": [
                    {"key": "customerName", "operator": "CONTAINS", "value": "Acme"},
                    {"key": "customerId", "operator": "IS_UNKNOWN", "value": "ignored"}
                ],
                "consequent": {"type": "GROUP", "group": 2}
            }"#,
        )
        .unwrap();
        let form = file.to_new_form(catalog()).unwrap();
        assert!(form.validate().unwrap().is_valid());
        assert_eq!(form.conditions().len(), 2);
        assert_eq!(form.conditions()[1].value, None);
    }

    #[test]
    fn test_missing_fields_are_reported_by_validation() {
        let file: RuleFile = serde_json::from_str(
            r#"{"type": "PRIORITY", "conditions": [{"key": "customerName"}], "consequent": {"type": "PRIORITY"}}"#,
        )
        .unwrap();
        let form = file.to_new_form(catalog()).unwrap();
        let validation = form.validate().unwrap();
        assert!(!validation.is_valid());
        assert!(validation.name.is_some());
        assert!(validation.consequent.priority.is_some());
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let file: RuleFile = serde_json::from_str(
            r#"{"type": "ASSIGNMENT", "name": "x", "conditions": [{"key": "nope"}], "consequent": {"type": "GROUP", "group": 1}}"#,
        )
        .unwrap();
        assert!(file.to_new_form(catalog()).is_err());
    }

    #[test]
    fn test_unknown_channel_names_the_condition() {
        let file: RuleFile = serde_json::from_str(
            r#"{"type": "ASSIGNMENT", "name": "x", "conditions": [{"key": "channelType", "operator": "IS", "value": "EMAIL"}], "consequent": {"type": "GROUP", "group": 1}}"#,
        )
        .unwrap();
        let err = file.to_new_form(catalog()).unwrap_err();
        assert_eq!(err.to_string(), "Condition 1");
        assert!(format!("{:#}", err).contains("EMAIL"));
    }
}
