//! Core domain entities
//!
//! All routing-rule entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

pub mod agent;
pub mod channel;
pub mod condition;
pub mod consequent;
pub mod custom_field;
mod field_error;
pub mod notification;
pub mod operator;
pub mod result;
pub mod rule;
pub mod rule_error;

pub use agent::{Agent, AgentGroup, AgentId, AgentType, BotAgent, GroupId};
pub use channel::{BotType, ChannelGroup, ChannelType};
pub use condition::{Condition, ConditionId, ConditionType};
pub use consequent::{Consequent, ConsequentType, PriorityLevel};
pub use custom_field::{CustomField, CustomFieldType, FieldScope};
pub use field_error::FieldError;
pub use notification::{Notification, NotificationLevel, Operation, Recovery};
pub use operator::{operators_for, Operator};
pub use rule::{
    Conditional, MatchPolicy, NewRule, Page, Rule, RuleId, RuleOrder, RuleStatus, RuleType,
    RuleUpdate,
};
pub use rule_error::{ConditionError, ConditionErrorType, ConsequentError, ConsequentField, RuleError};
