//! Consequent resolver - consequent editing state and type transitions

use crate::domain::result::{Error, Result};
use crate::domain::{
    AgentId, BotAgent, BotType, Consequent, ConsequentType, FieldError, GroupId, PriorityLevel,
    RuleType,
};

/// A consequent while it is being edited; every target may still be unset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsequentDraft {
    Group {
        group: Option<GroupId>,
    },
    GroupWithBotAgent {
        group: Option<GroupId>,
        agent: Option<BotAgent>,
    },
    Priority {
        priority: Option<PriorityLevel>,
    },
}

/// Client-side errors per consequent field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsequentErrors {
    pub group: Option<FieldError>,
    pub agent: Option<FieldError>,
    pub priority: Option<FieldError>,
}

impl ConsequentErrors {
    pub fn is_empty(&self) -> bool {
        self.group.is_none() && self.agent.is_none() && self.priority.is_none()
    }
}

/// Comparable summary of the chosen targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConsequentValue {
    consequent_type: ConsequentType,
    group: Option<GroupId>,
    agent: Option<AgentId>,
    priority: Option<PriorityLevel>,
}

impl ConsequentDraft {
    /// Empty consequent for a new rule of the given type
    pub fn empty(rule_type: RuleType) -> Self {
        match rule_type {
            RuleType::Assignment => ConsequentDraft::Group { group: None },
            RuleType::Priority => ConsequentDraft::Priority { priority: None },
        }
    }

    /// Draft of a persisted consequent. `agent` carries the resolved bot, if any.
    pub fn from_consequent(consequent: &Consequent, agent: Option<BotAgent>) -> Self {
        match *consequent {
            Consequent::Group { group } => ConsequentDraft::Group { group: Some(group) },
            Consequent::GroupWithBotAgent { group, agent: agent_id } => {
                let agent = agent
                    .filter(|a| a.id == agent_id)
                    .unwrap_or_else(|| BotAgent::unresolved(agent_id));
                ConsequentDraft::GroupWithBotAgent {
                    group: Some(group),
                    agent: Some(agent),
                }
            }
            Consequent::Priority { priority } => ConsequentDraft::Priority {
                priority: Some(priority),
            },
        }
    }

    pub fn consequent_type(&self) -> ConsequentType {
        match self {
            ConsequentDraft::Group { .. } => ConsequentType::Group,
            ConsequentDraft::GroupWithBotAgent { .. } => ConsequentType::GroupWithBotAgent,
            ConsequentDraft::Priority { .. } => ConsequentType::Priority,
        }
    }

    pub fn group(&self) -> Option<GroupId> {
        match self {
            ConsequentDraft::Group { group } | ConsequentDraft::GroupWithBotAgent { group, .. } => {
                *group
            }
            ConsequentDraft::Priority { .. } => None,
        }
    }

    pub fn agent(&self) -> Option<&BotAgent> {
        match self {
            ConsequentDraft::GroupWithBotAgent { agent, .. } => agent.as_ref(),
            _ => None,
        }
    }

    pub fn priority(&self) -> Option<PriorityLevel> {
        match self {
            ConsequentDraft::Priority { priority } => *priority,
            _ => None,
        }
    }

    /// Bot subtype constraining channel-type values.
    ///
    /// `None` when no bot is selected; `Some(None)` when a bot is selected
    /// but its subtype is unknown.
    pub fn bot_constraint(&self) -> Option<Option<BotType>> {
        self.agent().map(|agent| agent.bot_type)
    }

    /// Select a team. A bot that is not a member of the new team is dropped.
    pub fn set_group(&mut self, new_group: GroupId) -> Result<()> {
        match self {
            ConsequentDraft::Group { group } => {
                *group = Some(new_group);
                Ok(())
            }
            ConsequentDraft::GroupWithBotAgent { group, agent } => {
                if *group != Some(new_group) {
                    let keep = agent
                        .as_ref()
                        .map(|a| a.group_ids.contains(&new_group))
                        .unwrap_or(false);
                    if !keep {
                        *agent = None;
                    }
                }
                *group = Some(new_group);
                Ok(())
            }
            ConsequentDraft::Priority { .. } => {
                Err(Error::validation("priority rules have no team to select"))
            }
        }
    }

    pub fn set_agent(&mut self, new_agent: BotAgent) -> Result<()> {
        match self {
            ConsequentDraft::GroupWithBotAgent { agent, .. } => {
                *agent = Some(new_agent);
                Ok(())
            }
            _ => Err(Error::validation(
                "a bot agent can only be selected for team-with-bot consequents",
            )),
        }
    }

    pub fn set_priority(&mut self, level: PriorityLevel) -> Result<()> {
        match self {
            ConsequentDraft::Priority { priority } => {
                *priority = Some(level);
                Ok(())
            }
            _ => Err(Error::validation("only priority rules set a priority")),
        }
    }

    /// Client-side validation of the selected targets
    pub fn validate(&self) -> ConsequentErrors {
        let mut errors = ConsequentErrors::default();
        match self {
            ConsequentDraft::Group { group } => {
                if group.is_none() {
                    errors.group = Some(FieldError::Required);
                }
            }
            ConsequentDraft::GroupWithBotAgent { group, agent } => {
                if group.is_none() {
                    errors.group = Some(FieldError::Required);
                }
                match (group, agent) {
                    (_, None) => errors.agent = Some(FieldError::Required),
                    // Membership is only known once the bot has been resolved
                    (Some(group), Some(agent))
                        if !agent.group_ids.is_empty() && !agent.group_ids.contains(group) =>
                    {
                        errors.agent = Some(FieldError::AgentNotInGroup);
                    }
                    _ => {}
                }
            }
            ConsequentDraft::Priority { priority } => {
                if priority.is_none() {
                    errors.priority = Some(FieldError::Required);
                }
            }
        }
        errors
    }

    /// Persisted consequent, if every required target is chosen
    pub fn to_consequent(&self) -> Option<Consequent> {
        match self {
            ConsequentDraft::Group { group } => group.map(|group| Consequent::Group { group }),
            ConsequentDraft::GroupWithBotAgent { group, agent } => match (group, agent) {
                (Some(group), Some(agent)) => Some(Consequent::GroupWithBotAgent {
                    group: *group,
                    agent: agent.id,
                }),
                _ => None,
            },
            ConsequentDraft::Priority { priority } => {
                priority.map(|priority| Consequent::Priority { priority })
            }
        }
    }

    pub(crate) fn value(&self) -> ConsequentValue {
        ConsequentValue {
            consequent_type: self.consequent_type(),
            group: self.group(),
            agent: self.agent().map(|a| a.id),
            priority: self.priority(),
        }
    }
}

/// Switch a consequent to another type.
///
/// Switching between the two assignment shapes keeps nothing: team and
/// agent are both reset. Priority rules have a single consequent type.
pub fn transition(
    current: &ConsequentDraft,
    new_type: ConsequentType,
    rule_type: RuleType,
) -> Result<ConsequentDraft> {
    if !rule_type.permits(new_type) {
        return Err(Error::validation(format!(
            "{} rules cannot use a {} consequent",
            rule_type.as_str().to_lowercase(),
            new_type.as_str()
        )));
    }
    if current.consequent_type() == new_type {
        return Ok(current.clone());
    }
    Ok(match new_type {
        ConsequentType::Group => ConsequentDraft::Group { group: None },
        ConsequentType::GroupWithBotAgent => ConsequentDraft::GroupWithBotAgent {
            group: None,
            agent: None,
        },
        ConsequentType::Priority => ConsequentDraft::Priority { priority: None },
    })
}
