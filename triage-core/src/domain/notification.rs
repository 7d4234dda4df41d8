//! User-facing notifications emitted by the engine
//!
//! Notifications are side-effect requests for the view layer (toasts), not
//! rendered output. Each one names the operation that produced it so the
//! view can pick the right recovery affordance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A remote operation performed on behalf of the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    FetchRules,
    FetchRule,
    FetchCustomFields,
    FetchAgents,
    CreateRule,
    UpdateRule,
    DeleteRule,
    ToggleStatus,
    SaveOrder,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::FetchRules => "fetch_rules",
            Operation::FetchRule => "fetch_rule",
            Operation::FetchCustomFields => "fetch_custom_fields",
            Operation::FetchAgents => "fetch_agents",
            Operation::CreateRule => "create_rule",
            Operation::UpdateRule => "update_rule",
            Operation::DeleteRule => "delete_rule",
            Operation::ToggleStatus => "toggle_status",
            Operation::SaveOrder => "save_order",
        }
    }

    /// Reads are idempotent and may be retried; writes must be resubmitted by the user
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Operation::FetchRules
                | Operation::FetchRule
                | Operation::FetchCustomFields
                | Operation::FetchAgents
        )
    }

    /// Recovery offered when this operation fails on transport. Reads and
    /// deletes get a retry; other writes are resubmitted.
    pub fn recovery(&self) -> Recovery {
        if self.is_read() || *self == Operation::DeleteRule {
            Recovery::Retry
        } else {
            Recovery::Resubmit
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// How the user can recover from a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recovery {
    /// The view offers a retry action that repeats the same request
    Retry,
    /// No automatic retry; the user has to submit again
    Resubmit,
}

/// A dismissible notification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub operation: Operation,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Recovery>,
}

impl Notification {
    pub fn success(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            operation,
            message: message.into(),
            recovery: None,
        }
    }

    pub fn failure(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            operation,
            message: message.into(),
            recovery: Some(operation.recovery()),
        }
    }
}
