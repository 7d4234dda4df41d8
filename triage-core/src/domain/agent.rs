//! Agents and agent groups (teams)

use serde::{Deserialize, Serialize};

use super::channel::BotType;

/// Remote-assigned team identifier
pub type GroupId = i64;

/// Remote-assigned agent identifier
pub type AgentId = i64;

/// A team that tickets can be routed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentType {
    User,
    Bot,
}

/// An agent as returned by the agent directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub display_name: String,
    pub agent_type: AgentType,
    /// Present for bots whose subtype is known
    #[serde(default)]
    pub bot_type: Option<BotType>,
    #[serde(default)]
    pub group_ids: Vec<GroupId>,
}

impl Agent {
    pub fn is_bot(&self) -> bool {
        self.agent_type == AgentType::Bot
    }

    pub fn belongs_to(&self, group: GroupId) -> bool {
        self.group_ids.contains(&group)
    }
}

/// The bot picked as a consequent target, with what the form needs to know about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotAgent {
    pub id: AgentId,
    #[serde(default)]
    pub bot_type: Option<BotType>,
    #[serde(default)]
    pub group_ids: Vec<GroupId>,
}

impl BotAgent {
    /// A bot known only by id (e.g. its detail could not be loaded)
    pub fn unresolved(id: AgentId) -> Self {
        Self {
            id,
            bot_type: None,
            group_ids: Vec::new(),
        }
    }
}

impl From<&Agent> for BotAgent {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            bot_type: agent.bot_type,
            group_ids: agent.group_ids.clone(),
        }
    }
}
