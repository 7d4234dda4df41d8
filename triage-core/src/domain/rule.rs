//! Routing rule domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::consequent::Consequent;
use super::rule_error::RuleError;

/// Remote-assigned rule identifier
pub type RuleId = i64;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MIN_CONDITIONS: usize = 1;
pub const MAX_CONDITIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    /// Routes tickets to a team (optionally a bot)
    Assignment,
    /// Sets ticket priority
    Priority,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Assignment => "ASSIGNMENT",
            RuleType::Priority => "PRIORITY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "assignment" => Some(RuleType::Assignment),
            "priority" => Some(RuleType::Priority),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    On,
    Off,
}

impl RuleStatus {
    pub fn toggled(&self) -> Self {
        match self {
            RuleStatus::On => RuleStatus::Off,
            RuleStatus::Off => RuleStatus::On,
        }
    }
}

/// How the conditions of a rule combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchPolicy {
    #[default]
    All,
    Any,
}

/// Match policy, conditions and consequent of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditional {
    #[serde(rename = "match")]
    pub match_policy: MatchPolicy,
    pub conditions: Vec<Condition>,
    pub consequent: Consequent,
}

impl Conditional {
    /// Check the structural invariants for a rule of the given type
    pub fn validate(&self, rule_type: RuleType) -> Result<(), String> {
        if self.conditions.len() < MIN_CONDITIONS {
            return Err(format!("a rule needs at least {} condition", MIN_CONDITIONS));
        }
        if self.conditions.len() > MAX_CONDITIONS {
            return Err(format!("a rule can have at most {} conditions", MAX_CONDITIONS));
        }
        for (index, condition) in self.conditions.iter().enumerate() {
            condition
                .validate()
                .map_err(|e| format!("condition {}: {}", index + 1, e))?;
        }
        let consequent_type = self.consequent.consequent_type();
        if !rule_type.permits(consequent_type) {
            return Err(format!(
                "{} rules cannot use a {} consequent",
                rule_type.as_str().to_lowercase(),
                consequent_type.as_str()
            ));
        }
        Ok(())
    }
}

/// Trim and check a rule name
pub fn normalize_rule_name(name: &str) -> Result<String, &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("rule name cannot be empty");
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err("rule name cannot be longer than 100 characters");
    }
    Ok(trimmed.to_string())
}

/// A persisted routing rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub status: RuleStatus,
    /// Dense, 1-based position among the rules of the same type
    pub order: u32,
    pub conditional: Conditional,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RuleError>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Rule {
    pub fn is_on(&self) -> bool {
        self.status == RuleStatus::On
    }

    pub fn has_error(&self) -> bool {
        self.error.as_ref().map(|e| !e.is_empty()).unwrap_or(false)
    }
}

/// Payload for creating a rule; the store assigns id, status and order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRule {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub name: String,
    pub conditional: Conditional,
}

/// Partial update of a rule
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleUpdate {
    #[serde(skip)]
    pub id: RuleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RuleStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
}

impl RuleUpdate {
    pub fn new(id: RuleId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: RuleStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_conditional(mut self, conditional: Conditional) -> Self {
        self.conditional = Some(conditional);
        self
    }
}

/// One entry of a reorder request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOrder {
    pub id: RuleId,
    pub order: u32,
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::condition::ConditionType;
    use crate::domain::consequent::PriorityLevel;
    use crate::domain::operator::Operator;

    fn text_condition(value: &str) -> Condition {
        Condition::new("customerName", ConditionType::Text, Operator::Contains, Some(value.into()))
    }

    fn conditional(count: usize) -> Conditional {
        Conditional {
            match_policy: MatchPolicy::All,
            conditions: (0..count).map(|i| text_condition(&format!("v{}", i))).collect(),
            consequent: Consequent::Group { group: 1 },
        }
    }

    #[test]
    fn test_condition_count_bounds() {
        assert!(conditional(0).validate(RuleType::Assignment).is_err());
        assert!(conditional(1).validate(RuleType::Assignment).is_ok());
        assert!(conditional(10).validate(RuleType::Assignment).is_ok());
        assert!(conditional(11).validate(RuleType::Assignment).is_err());
    }

    #[test]
    fn test_consequent_must_match_rule_type() {
        let mut c = conditional(1);
        assert!(c.validate(RuleType::Priority).is_err());
        c.consequent = Consequent::Priority { priority: PriorityLevel::High };
        assert!(c.validate(RuleType::Priority).is_ok());
        assert!(c.validate(RuleType::Assignment).is_err());
    }

    #[test]
    fn test_rule_name_normalization() {
        assert_eq!(normalize_rule_name("  VIP  ").unwrap(), "VIP");
        assert!(normalize_rule_name("   ").is_err());
        assert!(normalize_rule_name(&"x".repeat(100)).is_ok());
        assert!(normalize_rule_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_update_serializes_only_set_fields() {
        let update = RuleUpdate::new(9).with_status(RuleStatus::Off);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"status": "OFF"}));
    }

    #[test]
    fn test_rule_deserializes_with_match_key() {
        let raw = r#"{
            "id": 1, "name": "VIP", "type": "ASSIGNMENT", "status": "ON", "order": 1,
            "conditional": {
                "match": "ANY",
                "conditions": [{"key": "customerId", "type": "TEXT", "operator": "IS", "value": "42"}],
                "consequent": {"type": "GROUP", "group": 3}
            }
        }"#;
        let rule: Rule = serde_json::from_str(raw).unwrap();
        assert_eq!(rule.conditional.match_policy, MatchPolicy::Any);
        assert!(rule.is_on());
        assert!(!rule.has_error());
    }
}
