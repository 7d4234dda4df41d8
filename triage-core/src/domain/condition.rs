//! Condition domain model

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::operator::Operator;

/// Value type of a condition, derived from its key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    Text,
    Number,
    Dropdown,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Text => "TEXT",
            ConditionType::Number => "NUMBER",
            ConditionType::Dropdown => "DROPDOWN",
        }
    }
}

/// Synthetic identity of a condition while it is being edited.
///
/// Positions shift when conditions are removed; ids do not. Positions are
/// only used when talking to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConditionId(Uuid);

impl ConditionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConditionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted condition: `<key> <operator> <value>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Condition {
    pub fn new(
        key: impl Into<String>,
        condition_type: ConditionType,
        operator: Operator,
        value: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            condition_type,
            operator,
            value,
        }
    }

    /// Check the shape invariants that hold regardless of the key catalog
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.key.trim().is_empty() {
            return Err("condition key cannot be empty");
        }
        if !self.operator.is_legal_for(self.condition_type) {
            return Err("operator is not allowed for this condition type");
        }
        let has_value = self
            .value
            .as_deref()
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if self.operator.requires_value() && !has_value {
            return Err("condition value is required");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_validation() {
        let cond = Condition::new("customerName", ConditionType::Text, Operator::Is, Some("Ann".into()));
        assert!(cond.validate().is_ok());

        let blank = Condition::new("customerName", ConditionType::Text, Operator::Is, Some("  ".into()));
        assert!(blank.validate().is_err());

        let valueless = Condition::new("customerName", ConditionType::Text, Operator::HasAnyValue, None);
        assert!(valueless.validate().is_ok());

        let wrong_op = Condition::new("channelType", ConditionType::Dropdown, Operator::Contains, Some("x".into()));
        assert_eq!(
            wrong_op.validate(),
            Err("operator is not allowed for this condition type")
        );
    }

    #[test]
    fn test_condition_serialization() {
        let cond = Condition::new("channelType", ConditionType::Dropdown, Operator::IsNot, Some("FACEBOOK_FEED".into()));
        let json = serde_json::to_value(&cond).unwrap();
        assert_eq!(json["type"], "DROPDOWN");
        assert_eq!(json["operator"], "IS_NOT");

        let valueless = Condition::new("customerId", ConditionType::Text, Operator::IsUnknown, None);
        let json = serde_json::to_value(&valueless).unwrap();
        assert!(json.get("value").is_none());
    }

    #[test]
    fn test_condition_ids_are_unique() {
        assert_ne!(ConditionId::new(), ConditionId::new());
    }
}
