//! Message catalog port - localized text lookup
//!
//! Every user-visible string the engine produces goes through a
//! `MessageCatalog` that callers pass in explicitly.

use crate::domain::{
    ChannelGroup, ChannelType, ConditionType, ConsequentType, FieldError, MatchPolicy, Operation,
    Operator, PriorityLevel,
};

/// Fixed (non custom-field) entries of the condition key catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemKey {
    TicketGroup,
    ChannelType,
    CustomerGroup,
    CustomerId,
    CustomerName,
}

/// Identifies one translatable message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKey {
    SystemKey(SystemKey),
    Operator { operator: Operator, numeric: bool },
    Channel(ChannelType),
    ChannelGroup(ChannelGroup),
    Priority(PriorityLevel),
    ConsequentType(ConsequentType),
    /// Prefix shown before a condition row ("If", "and", "or")
    ConditionPrefix { first: bool, policy: MatchPolicy },
    FieldError(FieldError),
    OperationSucceeded(Operation),
    OperationFailed(Operation),
}

pub trait MessageCatalog: Send + Sync {
    fn text(&self, key: &MessageKey) -> String;

    fn operator_label(&self, operator: Operator, condition_type: ConditionType) -> String {
        self.text(&MessageKey::Operator {
            operator,
            numeric: operator.uses_numeric_phrasing(condition_type),
        })
    }

    fn field_error(&self, error: &FieldError) -> String {
        self.text(&MessageKey::FieldError(error.clone()))
    }

    fn condition_prefix(&self, index: usize, policy: MatchPolicy) -> String {
        self.text(&MessageKey::ConditionPrefix {
            first: index == 0,
            policy,
        })
    }
}
