//! Directory ports - custom field definitions and agents

use async_trait::async_trait;

use crate::domain::result::StoreResult;
use crate::domain::{Agent, AgentGroup, AgentId, CustomField, GroupId, Page};

/// Custom field definitions that can be used as condition keys
#[async_trait]
pub trait CustomFieldDirectory: Send + Sync {
    async fn list_ticket_fields(&self, offset: usize, limit: usize) -> StoreResult<Page<CustomField>>;

    async fn list_customer_fields(&self, offset: usize, limit: usize)
        -> StoreResult<Page<CustomField>>;
}

/// Agent and team lookups
///
/// Only used to resolve display data (and the bot subtype) for a
/// consequent target that has already been chosen.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn get_agent_group(&self, id: GroupId) -> StoreResult<AgentGroup>;

    async fn get_agent(&self, id: AgentId) -> StoreResult<Agent>;
}
