//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::notification::Operation;
use super::rule_error::RuleError;

/// Failure reported by a remote collaborator (rule store, field or agent directory)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The server ran its own checks and rejected the payload
    #[error("Server validation failed")]
    Validation(RuleError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected for a reason that is not tied to a single field (e.g. duplicate name)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Unable to connect: {0}")]
    Connect(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Whether this is a server-side validation failure rather than a transport problem
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

/// Result type used by the port traits
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{operation} failed: {source}")]
    Store {
        operation: Operation,
        #[source]
        source: StoreError,
    },

    #[error("Server rejected the rule ({} condition error(s))", .0.conditions.len())]
    ServerValidation(RuleError),

    #[error("{0} is already in progress")]
    Busy(Operation),

    #[error("Rule order has unsaved changes; save or cancel it first")]
    OrderDraftPending,

    #[error("Request cancelled")]
    Cancelled,

    /// Catalog/data mismatch that should never reach a render path
    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invariant violation
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Wrap a store failure with the operation that produced it
    pub fn store(operation: Operation, source: StoreError) -> Self {
        match source {
            StoreError::Validation(payload) => Self::ServerValidation(payload),
            StoreError::NotFound(what) => Self::NotFound(what),
            source => Self::Store { operation, source },
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for JSON output at the CLI/view boundary)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }

    /// Create a failed result with context
    pub fn fail_with_context(
        error: impl Into<String>,
        context: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: Some(context),
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(Error::ServerValidation(payload)) => {
                let mut context = HashMap::new();
                if let Ok(value) = serde_json::to_value(&payload) {
                    context.insert("ruleError".to_string(), value);
                }
                Self::fail_with_context("Server rejected the rule", context)
            }
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule_error::{ConditionError, ConditionErrorType};

    #[test]
    fn test_operation_result_ok() {
        let result: OperationResult<i32> = OperationResult::ok(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_from_result() {
        let err: Result<i32> = Err(Error::validation("bad input"));
        let result: OperationResult<i32> = err.into();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Validation error"));
    }

    #[test]
    fn test_server_validation_keeps_payload_in_context() {
        let payload = RuleError {
            conditions: vec![ConditionError {
                index: 0,
                error_type: ConditionErrorType::Key,
                reason: "Field was deleted".to_string(),
            }],
            consequent: None,
        };
        let result: OperationResult<()> = Err(Error::ServerValidation(payload)).into();
        let context = result.context.unwrap();
        assert!(context.contains_key("ruleError"));
    }

    #[test]
    fn test_store_error_classification() {
        let validation = Error::store(
            Operation::CreateRule,
            StoreError::Validation(RuleError::default()),
        );
        assert!(matches!(validation, Error::ServerValidation(_)));

        let transport = Error::store(Operation::FetchRules, StoreError::Timeout);
        assert!(matches!(
            transport,
            Error::Store { operation: Operation::FetchRules, .. }
        ));
        assert!(!StoreError::Timeout.is_validation());
    }
}
