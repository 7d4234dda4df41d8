//! Consequent domain model - what a rule does when it matches

use serde::{Deserialize, Serialize};

use super::agent::{AgentId, GroupId};
use super::rule::RuleType;

/// Ticket priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityLevel {
    Urgent,
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    pub const ALL: [PriorityLevel; 4] = [
        PriorityLevel::Urgent,
        PriorityLevel::High,
        PriorityLevel::Medium,
        PriorityLevel::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::Urgent => "URGENT",
            PriorityLevel::High => "HIGH",
            PriorityLevel::Medium => "MEDIUM",
            PriorityLevel::Low => "LOW",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let upper = value.trim().to_uppercase();
        Self::ALL.into_iter().find(|p| p.as_str() == upper)
    }
}

/// Tag of a consequent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsequentType {
    Group,
    GroupWithBotAgent,
    Priority,
}

impl ConsequentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsequentType::Group => "GROUP",
            ConsequentType::GroupWithBotAgent => "GROUP_WITH_BOT_AGENT",
            ConsequentType::Priority => "PRIORITY",
        }
    }
}

/// A persisted consequent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Consequent {
    /// Route the ticket to a team
    Group { group: GroupId },
    /// Route the ticket to a team and hand it to one of the team's bots
    GroupWithBotAgent { group: GroupId, agent: AgentId },
    /// Set the ticket priority
    Priority { priority: PriorityLevel },
}

impl Consequent {
    pub fn consequent_type(&self) -> ConsequentType {
        match self {
            Consequent::Group { .. } => ConsequentType::Group,
            Consequent::GroupWithBotAgent { .. } => ConsequentType::GroupWithBotAgent,
            Consequent::Priority { .. } => ConsequentType::Priority,
        }
    }

    pub fn group(&self) -> Option<GroupId> {
        match self {
            Consequent::Group { group } | Consequent::GroupWithBotAgent { group, .. } => {
                Some(*group)
            }
            Consequent::Priority { .. } => None,
        }
    }

    pub fn agent(&self) -> Option<AgentId> {
        match self {
            Consequent::GroupWithBotAgent { agent, .. } => Some(*agent),
            _ => None,
        }
    }
}

impl RuleType {
    /// Consequent tags a rule of this type may carry
    pub fn consequent_types(&self) -> &'static [ConsequentType] {
        match self {
            RuleType::Assignment => &[ConsequentType::Group, ConsequentType::GroupWithBotAgent],
            RuleType::Priority => &[ConsequentType::Priority],
        }
    }

    pub fn permits(&self, consequent_type: ConsequentType) -> bool {
        self.consequent_types().contains(&consequent_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_type_permits() {
        assert!(RuleType::Assignment.permits(ConsequentType::Group));
        assert!(RuleType::Assignment.permits(ConsequentType::GroupWithBotAgent));
        assert!(!RuleType::Assignment.permits(ConsequentType::Priority));
        assert!(RuleType::Priority.permits(ConsequentType::Priority));
        assert!(!RuleType::Priority.permits(ConsequentType::Group));
    }

    #[test]
    fn test_consequent_wire_shape() {
        let c = Consequent::GroupWithBotAgent { group: 7, agent: 42 };
        let json = serde_json::to_value(c).unwrap();
        assert_eq!(json["type"], "GROUP_WITH_BOT_AGENT");
        assert_eq!(json["group"], 7);
        assert_eq!(json["agent"], 42);

        let parsed: Consequent =
            serde_json::from_str(r#"{"type":"PRIORITY","priority":"URGENT"}"#).unwrap();
        assert_eq!(parsed, Consequent::Priority { priority: PriorityLevel::Urgent });
    }

    #[test]
    fn test_accessors() {
        let c = Consequent::Group { group: 3 };
        assert_eq!(c.group(), Some(3));
        assert_eq!(c.agent(), None);
        assert_eq!(c.consequent_type(), ConsequentType::Group);
    }
}
