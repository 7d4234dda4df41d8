//! Rule store port - remote rule persistence

use async_trait::async_trait;

use crate::domain::result::StoreResult;
use crate::domain::{NewRule, Page, Rule, RuleId, RuleOrder, RuleType, RuleUpdate};

/// Remote rule store
///
/// Ids, status defaults and orders are assigned by the store, never the
/// client. Validation failures come back as `StoreError::Validation` with
/// an index-keyed `RuleError` payload.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// List one page of rules of a type, ordered by `order`
    async fn list(&self, rule_type: RuleType, offset: usize, limit: usize) -> StoreResult<Page<Rule>>;

    /// Fetch one rule
    async fn get(&self, id: RuleId) -> StoreResult<Rule>;

    /// Create a rule; it is appended at the end of its type's order
    async fn create(&self, rule: &NewRule) -> StoreResult<Rule>;

    /// Update the fields present in `update`
    async fn update(&self, update: &RuleUpdate) -> StoreResult<Rule>;

    /// Delete a rule; later rules of the same type move up by one
    async fn delete(&self, id: RuleId) -> StoreResult<()>;

    /// Replace the order of all rules of a type in one request
    async fn reorder(&self, rule_type: RuleType, orders: &[RuleOrder]) -> StoreResult<()>;
}
