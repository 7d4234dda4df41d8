//! Server-reported rule errors
//!
//! The server reports problems with a saved rule positionally: condition
//! errors carry the index of the offending condition in the rule's
//! condition list.

use serde::{Deserialize, Serialize};

/// Which part of a condition the server complained about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionErrorType {
    Key,
    Type,
    Operator,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionError {
    pub index: usize,
    pub error_type: ConditionErrorType,
    pub reason: String,
}

/// Which consequent field the server complained about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsequentField {
    #[serde(rename = "_group")]
    Group,
    #[serde(rename = "_agent")]
    Agent,
    #[serde(rename = "_priority")]
    Priority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsequentError {
    pub field: ConsequentField,
    pub reason: String,
}

/// Error structure attached to a rule by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleError {
    #[serde(default)]
    pub conditions: Vec<ConditionError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequent: Option<ConsequentError>,
}

impl RuleError {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.consequent.is_none()
    }

    pub fn with_condition(
        mut self,
        index: usize,
        error_type: ConditionErrorType,
        reason: impl Into<String>,
    ) -> Self {
        self.conditions.push(ConditionError {
            index,
            error_type,
            reason: reason.into(),
        });
        self
    }

    pub fn with_consequent(mut self, field: ConsequentField, reason: impl Into<String>) -> Self {
        self.consequent = Some(ConsequentError {
            field,
            reason: reason.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let raw = r#"{
            "conditions": [{"index": 2, "errorType": "VALUE", "reason": "Unknown option"}],
            "consequent": {"field": "_agent", "reason": "Agent left the team"}
        }"#;
        let error: RuleError = serde_json::from_str(raw).unwrap();
        assert_eq!(error.conditions[0].index, 2);
        assert_eq!(error.conditions[0].error_type, ConditionErrorType::Value);
        assert_eq!(error.consequent.as_ref().unwrap().field, ConsequentField::Agent);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let error: RuleError = serde_json::from_str("{}").unwrap();
        assert!(error.is_empty());
    }
}
