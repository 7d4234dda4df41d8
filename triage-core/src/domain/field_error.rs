//! Per-field validation errors shown inline in the rule editor

use serde::Serialize;

/// A validation error attached to one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldError {
    Required,
    TooLong { max: usize },
    DigitsOnly,
    /// Value is not in the key's option set
    NotAnOption,
    OperatorNotAllowed,
    UnknownKey,
    /// Channel is not served by the selected custom bot
    UnsupportedByCustomBot,
    /// Channel is not served by the selected FAQ bot
    UnsupportedByFaqBot,
    /// Channel may not be served by the selected bot (subtype unknown)
    UnsupportedByBot,
    AgentNotInGroup,
    TooFewConditions { min: usize },
    TooManyConditions { max: usize },
    /// Reported by the server, not derived locally
    Server { reason: String },
}

impl FieldError {
    pub fn is_server(&self) -> bool {
        matches!(self, FieldError::Server { .. })
    }
}
