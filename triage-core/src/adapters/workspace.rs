//! Local workspace - rules, custom fields and agents in a JSON file
//!
//! Implements every store port without a server. It behaves like the
//! remote API: it assigns ids and orders, keeps orders dense per rule type
//! and runs the server's own checks, reporting them positionally.

use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::result::{StoreError, StoreResult};
use crate::domain::rule::{MAX_CONDITIONS, MIN_CONDITIONS};
use crate::domain::{
    Agent, AgentGroup, AgentId, ChannelType, ConditionErrorType, ConditionType, Conditional,
    Consequent, ConsequentField, CustomField, GroupId, NewRule, Page, Rule, RuleError, RuleId,
    RuleOrder, RuleStatus, RuleType, RuleUpdate,
};
use crate::ports::{AgentDirectory, CustomFieldDirectory, RuleStore};
use crate::services::catalog::{
    customer_field_key, ticket_field_key, CHANNEL_TYPE_KEY, CUSTOMER_ID_KEY, CUSTOMER_NAME_KEY,
};
use crate::services::ordering::reorder;

/// Everything a workspace holds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceData {
    #[serde(default)]
    pub next_rule_id: RuleId,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub ticket_fields: Vec<CustomField>,
    #[serde(default)]
    pub customer_fields: Vec<CustomField>,
    #[serde(default)]
    pub groups: Vec<AgentGroup>,
    #[serde(default)]
    pub agents: Vec<Agent>,
}

impl WorkspaceData {
    fn rules_of(&self, rule_type: RuleType) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.rule_type == rule_type)
    }

    fn allocate_id(&mut self) -> RuleId {
        let max = self.rules.iter().map(|r| r.id).max().unwrap_or(0);
        self.next_rule_id = self.next_rule_id.max(max) + 1;
        self.next_rule_id
    }

    /// Condition keys the server accepts, with their type and options
    fn key_specs(&self) -> HashMap<String, (ConditionType, Vec<String>)> {
        let mut specs = HashMap::new();
        specs.insert(
            CHANNEL_TYPE_KEY.to_string(),
            (
                ConditionType::Dropdown,
                ChannelType::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            ),
        );
        specs.insert(CUSTOMER_ID_KEY.to_string(), (ConditionType::Text, Vec::new()));
        specs.insert(CUSTOMER_NAME_KEY.to_string(), (ConditionType::Text, Vec::new()));
        let fields = self
            .ticket_fields
            .iter()
            .map(|f| (ticket_field_key(&f.key), f))
            .chain(
                self.customer_fields
                    .iter()
                    .map(|f| (customer_field_key(&f.key), f)),
            );
        for (key, field) in fields {
            if let Some(condition_type) = field.field_type.condition_type() {
                specs.insert(key, (condition_type, field.options.clone()));
            }
        }
        specs
    }
}

/// JSON-file (or purely in-memory) rule store
pub struct LocalWorkspace {
    path: Option<PathBuf>,
    data: Mutex<WorkspaceData>,
}

impl LocalWorkspace {
    /// Workspace that is never written to disk
    pub fn in_memory(data: WorkspaceData) -> Self {
        Self {
            path: None,
            data: Mutex::new(data),
        }
    }

    /// Open the workspace file, starting empty if it does not exist
    pub fn open(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read workspace {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse workspace {}", path.display()))?
        } else {
            WorkspaceData::default()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            data: Mutex::new(data),
        })
    }

    /// Open the workspace file, seeding it with `seed` if it does not exist yet
    pub fn open_or_seed(path: &Path, seed: impl FnOnce() -> WorkspaceData) -> Result<Self> {
        if path.exists() {
            return Self::open(path);
        }
        let workspace = Self {
            path: Some(path.to_path_buf()),
            data: Mutex::new(seed()),
        };
        {
            let data = workspace.lock().map_err(|e| anyhow::anyhow!(e))?;
            workspace.persist(&data)?;
        }
        Ok(workspace)
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> StoreResult<WorkspaceData> {
        Ok(self.lock()?.clone())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, WorkspaceData>> {
        self.data
            .lock()
            .map_err(|e| StoreError::Connect(format!("workspace lock poisoned: {}", e)))
    }

    fn persist(&self, data: &WorkspaceData) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open workspace {}", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock workspace {}", path.display()))?;
        let written = file
            .set_len(0)
            .and_then(|_| file.write_all(contents.as_bytes()))
            .and_then(|_| file.sync_all());
        file.unlock()?;
        written.with_context(|| format!("Failed to write workspace {}", path.display()))
    }

    /// Write `next` to disk, then make it the current contents
    ///
    /// On a failed write `current` is left as it was.
    fn commit(&self, current: &mut WorkspaceData, next: WorkspaceData) -> StoreResult<()> {
        self.persist(&next).map_err(|e| {
            warn!(error = %e, "workspace write failed");
            StoreError::Http {
                status: 500,
                message: e.to_string(),
            }
        })?;
        *current = next;
        Ok(())
    }
}

/// Run the checks the server runs on a rule before accepting it
fn check_rule(
    data: &WorkspaceData,
    rule_type: RuleType,
    name: &str,
    conditional: &Conditional,
    existing: Option<RuleId>,
) -> StoreResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(bad_request("name is required"));
    }
    let duplicate = data
        .rules_of(rule_type)
        .any(|r| Some(r.id) != existing && r.name.trim().eq_ignore_ascii_case(trimmed));
    if duplicate {
        return Err(StoreError::Conflict(format!(
            "a {} rule named '{}' already exists",
            rule_type.as_str().to_lowercase(),
            trimmed
        )));
    }

    let count = conditional.conditions.len();
    if !(MIN_CONDITIONS..=MAX_CONDITIONS).contains(&count) {
        return Err(bad_request(format!(
            "a rule needs between {} and {} conditions, got {}",
            MIN_CONDITIONS, MAX_CONDITIONS, count
        )));
    }
    if !rule_type.permits(conditional.consequent.consequent_type()) {
        return Err(bad_request("consequent does not match the rule type"));
    }

    let mut error = RuleError::default();

    let bot = match conditional.consequent {
        Consequent::GroupWithBotAgent { agent, .. } => {
            data.agents.iter().find(|a| a.id == agent && a.is_bot())
        }
        _ => None,
    };

    let specs = data.key_specs();
    for (index, condition) in conditional.conditions.iter().enumerate() {
        let Some((condition_type, options)) = specs.get(&condition.key) else {
            error = error.with_condition(index, ConditionErrorType::Key, "Unknown condition key");
            continue;
        };
        if condition.condition_type != *condition_type {
            error = error.with_condition(
                index,
                ConditionErrorType::Type,
                format!("Expected a {} condition", condition_type.as_str().to_lowercase()),
            );
            continue;
        }
        if !condition.operator.is_legal_for(*condition_type) {
            error = error.with_condition(
                index,
                ConditionErrorType::Operator,
                "Operator is not allowed for this key",
            );
            continue;
        }
        if condition.operator.is_valueless() {
            continue;
        }
        let value = condition.value.as_deref().map(str::trim).unwrap_or("");
        let reason = if value.is_empty() {
            Some("Value is required")
        } else if *condition_type == ConditionType::Number
            && !value.chars().all(|c| c.is_ascii_digit())
        {
            Some("Value must be a number")
        } else if *condition_type == ConditionType::Dropdown && !options.iter().any(|o| o == value)
        {
            Some("Value is not one of the options")
        } else if condition.key == CHANNEL_TYPE_KEY {
            let unsupported = bot
                .zip(ChannelType::parse(value))
                .map(|(bot, channel)| !channel.supports_bot(bot.bot_type))
                .unwrap_or(false);
            unsupported.then_some("Channel is not supported by the selected bot")
        } else {
            None
        };
        if let Some(reason) = reason {
            error = error.with_condition(index, ConditionErrorType::Value, reason);
        }
    }

    if let Some((field, reason)) = check_consequent(data, &conditional.consequent) {
        error = error.with_consequent(field, reason);
    }

    if error.is_empty() {
        Ok(())
    } else {
        debug!(
            conditions = error.conditions.len(),
            consequent = error.consequent.is_some(),
            "workspace rejected rule"
        );
        Err(StoreError::Validation(error))
    }
}

fn check_consequent(
    data: &WorkspaceData,
    consequent: &Consequent,
) -> Option<(ConsequentField, &'static str)> {
    let group_exists = |id: GroupId| data.groups.iter().any(|g| g.id == id);
    match *consequent {
        Consequent::Group { group } => {
            (!group_exists(group)).then_some((ConsequentField::Group, "Team does not exist"))
        }
        Consequent::GroupWithBotAgent { group, agent } => {
            if !group_exists(group) {
                return Some((ConsequentField::Group, "Team does not exist"));
            }
            match data.agents.iter().find(|a| a.id == agent) {
                None => Some((ConsequentField::Agent, "Agent does not exist")),
                Some(a) if !a.is_bot() => Some((ConsequentField::Agent, "Agent is not a bot")),
                Some(a) if !a.belongs_to(group) => {
                    Some((ConsequentField::Agent, "Bot is not a member of the team"))
                }
                Some(_) => None,
            }
        }
        Consequent::Priority { .. } => None,
    }
}

fn bad_request(message: impl Into<String>) -> StoreError {
    StoreError::Http {
        status: 400,
        message: message.into(),
    }
}

fn not_found(what: &str, id: i64) -> StoreError {
    StoreError::NotFound(format!("{} {}", what, id))
}

fn page<T: Clone>(items: &[T], offset: usize, limit: usize) -> Page<T> {
    Page {
        results: items.iter().skip(offset).take(limit).cloned().collect(),
        count: items.len(),
    }
}

/// Renumber the rules of a type `1..=n`, keeping their relative order
fn compact_orders(data: &mut WorkspaceData, rule_type: RuleType) {
    let mut rules: Vec<&mut Rule> = data
        .rules
        .iter_mut()
        .filter(|r| r.rule_type == rule_type)
        .collect();
    rules.sort_by_key(|r| (r.order, r.id));
    for (i, rule) in rules.into_iter().enumerate() {
        rule.order = i as u32 + 1;
    }
}

fn apply_orders(data: &mut WorkspaceData, orders: &[RuleOrder]) {
    let by_id: HashMap<RuleId, u32> = orders.iter().map(|o| (o.id, o.order)).collect();
    for rule in data.rules.iter_mut() {
        if let Some(order) = by_id.get(&rule.id) {
            rule.order = *order;
        }
    }
}

#[async_trait]
impl RuleStore for LocalWorkspace {
    async fn list(&self, rule_type: RuleType, offset: usize, limit: usize) -> StoreResult<Page<Rule>> {
        let data = self.lock()?;
        let mut rules: Vec<Rule> = data.rules_of(rule_type).cloned().collect();
        rules.sort_by_key(|r| r.order);
        Ok(page(&rules, offset, limit))
    }

    async fn get(&self, id: RuleId) -> StoreResult<Rule> {
        let data = self.lock()?;
        data.rules
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| not_found("rule", id))
    }

    async fn create(&self, rule: &NewRule) -> StoreResult<Rule> {
        let mut data = self.lock()?;
        check_rule(&data, rule.rule_type, &rule.name, &rule.conditional, None)?;

        let mut next = data.clone();
        let now = Utc::now();
        let created = Rule {
            id: next.allocate_id(),
            name: rule.name.trim().to_string(),
            rule_type: rule.rule_type,
            status: RuleStatus::On,
            order: data.rules_of(rule.rule_type).count() as u32 + 1,
            conditional: rule.conditional.clone(),
            error: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        next.rules.push(created.clone());
        self.commit(&mut data, next)?;
        debug!(rule_id = created.id, order = created.order, "workspace created rule");
        Ok(created)
    }

    async fn update(&self, update: &RuleUpdate) -> StoreResult<Rule> {
        let mut data = self.lock()?;
        let index = data
            .rules
            .iter()
            .position(|r| r.id == update.id)
            .ok_or_else(|| not_found("rule", update.id))?;
        let current = data.rules[index].clone();

        if update.name.is_some() || update.conditional.is_some() {
            let name = update.name.as_deref().unwrap_or(&current.name);
            let conditional = update.conditional.as_ref().unwrap_or(&current.conditional);
            check_rule(&data, current.rule_type, name, conditional, Some(current.id))?;
        }

        let mut next = data.clone();
        if let Some(order) = update.order {
            let orders: Vec<RuleOrder> = next
                .rules_of(current.rule_type)
                .map(|r| RuleOrder {
                    id: r.id,
                    order: r.order,
                })
                .collect();
            let moved = reorder(&orders, current.order, order)
                .map_err(|e| bad_request(e.to_string()))?;
            apply_orders(&mut next, &moved);
        }

        let rule = &mut next.rules[index];
        if let Some(name) = &update.name {
            rule.name = name.trim().to_string();
        }
        if let Some(status) = update.status {
            rule.status = status;
        }
        if let Some(conditional) = &update.conditional {
            rule.conditional = conditional.clone();
            rule.error = None;
        }
        rule.updated_at = Some(Utc::now());
        let updated = rule.clone();

        self.commit(&mut data, next)?;
        Ok(updated)
    }

    async fn delete(&self, id: RuleId) -> StoreResult<()> {
        let mut data = self.lock()?;
        let index = data
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| not_found("rule", id))?;
        let mut next = data.clone();
        let removed = next.rules.remove(index);
        compact_orders(&mut next, removed.rule_type);
        self.commit(&mut data, next)?;
        Ok(())
    }

    async fn reorder(&self, rule_type: RuleType, orders: &[RuleOrder]) -> StoreResult<()> {
        let mut data = self.lock()?;
        let expected: HashSet<RuleId> = data.rules_of(rule_type).map(|r| r.id).collect();
        let given: HashSet<RuleId> = orders.iter().map(|o| o.id).collect();
        if expected != given || given.len() != orders.len() {
            return Err(bad_request("reorder must list every rule of the type exactly once"));
        }
        let mut positions: Vec<u32> = orders.iter().map(|o| o.order).collect();
        positions.sort_unstable();
        if positions.iter().enumerate().any(|(i, o)| *o != i as u32 + 1) {
            return Err(bad_request("orders must be 1..=n"));
        }
        let mut next = data.clone();
        apply_orders(&mut next, orders);
        self.commit(&mut data, next)?;
        Ok(())
    }
}

#[async_trait]
impl CustomFieldDirectory for LocalWorkspace {
    async fn list_ticket_fields(&self, offset: usize, limit: usize) -> StoreResult<Page<CustomField>> {
        Ok(page(&self.lock()?.ticket_fields, offset, limit))
    }

    async fn list_customer_fields(
        &self,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Page<CustomField>> {
        Ok(page(&self.lock()?.customer_fields, offset, limit))
    }
}

#[async_trait]
impl AgentDirectory for LocalWorkspace {
    async fn get_agent_group(&self, id: GroupId) -> StoreResult<AgentGroup> {
        self.lock()?
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| not_found("team", id))
    }

    async fn get_agent(&self, id: AgentId) -> StoreResult<Agent> {
        self.lock()?
            .agents
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| not_found("agent", id))
    }
}
