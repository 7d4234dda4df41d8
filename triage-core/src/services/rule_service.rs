//! Rule service - fetch, save, delete, toggle and reorder rules
//!
//! Every write is followed by a refetch of the rule list; nothing is applied
//! to the list optimistically except the draft order. Failures are logged
//! with their operation before being turned into a notification.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{
    Agent, AgentGroup, BotAgent, Consequent, Notification, Operation, Rule, RuleId, RuleType,
    RuleUpdate,
};
use crate::ports::{AgentDirectory, MessageCatalog, MessageKey, Notifier, RuleStore};

use super::catalog::KeyCatalog;
use super::logging::{LogEvent, LoggingService};
use super::ordering::RuleList;
use super::rule_form::{FormMode, RuleForm};

/// Target of a mutation; a second mutation of the same target is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum MutationKey {
    Create(RuleType),
    Rule(RuleId),
    Order(RuleType),
}

/// Removes its key from the in-flight set when dropped
struct InFlight<'a> {
    set: &'a Mutex<HashSet<MutationKey>>,
    key: MutationKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.key);
        }
    }
}

/// A rule opened for editing, with the display data of its consequent target
#[derive(Debug, Clone)]
pub struct RuleEditor {
    pub form: RuleForm,
    pub group: Option<AgentGroup>,
    pub agent: Option<Agent>,
}

/// Orchestrates the rule store, agent directory and notifier
pub struct RuleService {
    store: Arc<dyn RuleStore>,
    agents: Arc<dyn AgentDirectory>,
    notifier: Arc<dyn Notifier>,
    messages: Arc<dyn MessageCatalog>,
    logger: Option<Arc<LoggingService>>,
    page_size: usize,
    in_flight: Mutex<HashSet<MutationKey>>,
}

impl RuleService {
    pub fn new(
        store: Arc<dyn RuleStore>,
        agents: Arc<dyn AgentDirectory>,
        notifier: Arc<dyn Notifier>,
        messages: Arc<dyn MessageCatalog>,
        page_size: usize,
    ) -> Self {
        Self {
            store,
            agents,
            notifier,
            messages,
            logger: None,
            page_size: page_size.max(1),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Also record events in the persistent event log
    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Every rule of a type, following pagination until `count` is reached
    pub async fn list_rules(&self, rule_type: RuleType) -> Result<Vec<Rule>> {
        let mut rules = Vec::new();
        loop {
            let page = self
                .store
                .list(rule_type, rules.len(), self.page_size)
                .await
                .map_err(|e| Error::store(Operation::FetchRules, e))?;
            let received = page.results.len();
            rules.extend(page.results);
            if received == 0 || rules.len() >= page.count {
                break;
            }
        }
        debug!(rule_type = rule_type.as_str(), count = rules.len(), "fetched rules");
        Ok(rules)
    }

    /// Fetch the list view of one rule type
    pub async fn load_list(
        &self,
        rule_type: RuleType,
        token: &CancellationToken,
    ) -> Result<RuleList> {
        let rules = self
            .reading(Operation::FetchRules, None, token, self.list_rules(rule_type))
            .await?;
        Ok(RuleList::from_rules(rule_type, rules))
    }

    /// Refetch the list. Any draft order is dropped.
    pub async fn refresh(&self, list: &mut RuleList, token: &CancellationToken) -> Result<()> {
        let rule_type = list.rule_type();
        let rules = self
            .reading(Operation::FetchRules, None, token, self.list_rules(rule_type))
            .await?;
        if list.is_order_dirty() {
            info!(rule_type = rule_type.as_str(), "refresh discarded unsaved rule order");
        }
        list.replace(rules);
        Ok(())
    }

    pub async fn get_rule(&self, id: RuleId, token: &CancellationToken) -> Result<Rule> {
        self.reading(Operation::FetchRule, Some(id), token, async {
            self.store
                .get(id)
                .await
                .map_err(|e| Error::store(Operation::FetchRule, e))
        })
        .await
    }

    /// Load a rule into an editing form.
    ///
    /// The consequent's team and bot are looked up for display. A failed
    /// lookup is logged and the form keeps the bot as unresolved.
    pub async fn open_editor(
        &self,
        id: RuleId,
        catalog: Arc<KeyCatalog>,
        token: &CancellationToken,
    ) -> Result<RuleEditor> {
        let rule = self.get_rule(id, token).await?;

        let (group_id, agent_id) = match rule.conditional.consequent {
            Consequent::Group { group } => (Some(group), None),
            Consequent::GroupWithBotAgent { group, agent } => (Some(group), Some(agent)),
            Consequent::Priority { .. } => (None, None),
        };

        let group = match group_id {
            Some(group_id) => {
                let lookup = self.agents.get_agent_group(group_id);
                match cancellable(token, lookup).await? {
                    Ok(group) => Some(group),
                    Err(e) => {
                        warn!(rule_id = id, group_id, error = %e, "could not resolve team");
                        None
                    }
                }
            }
            None => None,
        };

        let agent = match agent_id {
            Some(agent_id) => {
                let lookup = self.agents.get_agent(agent_id);
                match cancellable(token, lookup).await? {
                    Ok(agent) => Some(agent),
                    Err(e) => {
                        let error = Error::store(Operation::FetchAgents, e);
                        self.report_failure(Operation::FetchAgents, &error, Some(id), None);
                        None
                    }
                }
            }
            None => None,
        };

        let bot = agent.as_ref().map(BotAgent::from);
        let form = RuleForm::from_rule(&rule, bot, catalog);
        debug!(rule_id = id, pending_errors = rule.has_error(), "opened rule editor");
        Ok(RuleEditor { form, group, agent })
    }

    /// Blank form; refused while the list has an unsaved draft order
    pub fn new_form(&self, list: &RuleList, catalog: Arc<KeyCatalog>) -> Result<RuleForm> {
        ensure_no_draft(list)?;
        Ok(RuleForm::new_rule(list.rule_type(), catalog))
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Create or update the rule in `form`, then refetch `list`.
    ///
    /// A server validation failure is applied to the form and returned as
    /// `Error::ServerValidation`. An edit with no changes is refused before
    /// anything is sent.
    pub async fn submit(&self, form: &mut RuleForm, list: &mut RuleList) -> Result<Rule> {
        ensure_no_draft(list)?;
        if let FormMode::Editing(id) = form.mode() {
            if !form.is_dirty() {
                return Err(Error::validation(format!("rule {} has no changes to save", id)));
            }
        }
        let payload = form.payload()?;
        let rule_type = form.rule_type();

        let (operation, key, rule_id) = match form.mode() {
            FormMode::Creating => (Operation::CreateRule, MutationKey::Create(rule_type), None),
            FormMode::Editing(id) => (Operation::UpdateRule, MutationKey::Rule(id), Some(id)),
        };
        let _guard = self.begin(key, operation)?;

        let result = match rule_id {
            None => self.store.create(&payload.into_new_rule()).await,
            Some(id) => self.store.update(&payload.into_update(id)).await,
        };

        match result {
            Ok(rule) => {
                form.mark_saved(&rule);
                self.report_success(operation, Some(rule.id), Some(rule_type));
                self.refresh_after_write(list).await;
                Ok(rule)
            }
            Err(e) => {
                let error = Error::store(operation, e);
                if let Error::ServerValidation(payload) = &error {
                    form.apply_server_error(payload);
                }
                self.report_failure(operation, &error, rule_id, Some(rule_type));
                Err(error)
            }
        }
    }

    pub async fn delete_rule(&self, list: &mut RuleList, id: RuleId) -> Result<()> {
        ensure_no_draft(list)?;
        let rule_type = list.rule_type();
        let _guard = self.begin(MutationKey::Rule(id), Operation::DeleteRule)?;

        match self.store.delete(id).await {
            Ok(()) => {
                self.report_success(Operation::DeleteRule, Some(id), Some(rule_type));
                self.refresh_after_write(list).await;
                Ok(())
            }
            Err(e) => {
                let error = Error::store(Operation::DeleteRule, e);
                self.report_failure(Operation::DeleteRule, &error, Some(id), Some(rule_type));
                Err(error)
            }
        }
    }

    /// Flip a rule between `On` and `Off`
    pub async fn toggle_status(&self, list: &mut RuleList, id: RuleId) -> Result<Rule> {
        ensure_no_draft(list)?;
        let rule_type = list.rule_type();
        let status = list
            .get(id)
            .map(|rule| rule.status.toggled())
            .ok_or_else(|| Error::not_found(format!("rule {}", id)))?;
        let _guard = self.begin(MutationKey::Rule(id), Operation::ToggleStatus)?;

        match self.store.update(&RuleUpdate::new(id).with_status(status)).await {
            Ok(rule) => {
                self.report_success(Operation::ToggleStatus, Some(id), Some(rule_type));
                self.refresh_after_write(list).await;
                Ok(rule)
            }
            Err(e) => {
                let error = Error::store(Operation::ToggleStatus, e);
                self.report_failure(Operation::ToggleStatus, &error, Some(id), Some(rule_type));
                Err(error)
            }
        }
    }

    /// Persist the draft order in one request. A clean draft is a no-op.
    ///
    /// On failure the draft is kept so the user can save again or cancel.
    pub async fn save_order(&self, list: &mut RuleList) -> Result<()> {
        if !list.is_order_dirty() {
            debug!(rule_type = list.rule_type().as_str(), "rule order unchanged, nothing to save");
            return Ok(());
        }
        let rule_type = list.rule_type();
        let _guard = self.begin(MutationKey::Order(rule_type), Operation::SaveOrder)?;
        let orders = list.order_payload();

        match self.store.reorder(rule_type, &orders).await {
            Ok(()) => {
                self.report_success(Operation::SaveOrder, None, Some(rule_type));
                self.refresh_after_write(list).await;
                Ok(())
            }
            Err(e) => {
                let error = Error::store(Operation::SaveOrder, e);
                self.report_failure(Operation::SaveOrder, &error, None, Some(rule_type));
                Err(error)
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn begin(&self, key: MutationKey, operation: Operation) -> Result<InFlight<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))?;
        if !set.insert(key) {
            debug!(?key, %operation, "mutation already in flight");
            return Err(Error::Busy(operation));
        }
        Ok(InFlight {
            set: &self.in_flight,
            key,
        })
    }

    /// Run a read under `token`, reporting failures other than cancellation
    async fn reading<T>(
        &self,
        operation: Operation,
        rule_id: Option<RuleId>,
        token: &CancellationToken,
        request: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match cancellable(token, request).await.and_then(|inner| inner) {
            Ok(value) => Ok(value),
            Err(Error::Cancelled) => {
                debug!(%operation, ?rule_id, "request cancelled, result discarded");
                Err(Error::Cancelled)
            }
            Err(error) => {
                self.report_failure(operation, &error, rule_id, None);
                Err(error)
            }
        }
    }

    /// Refetch after a successful write. The write stands even if this fails.
    async fn refresh_after_write(&self, list: &mut RuleList) {
        let token = CancellationToken::new();
        if let Err(e) = self.refresh(list, &token).await {
            warn!(rule_type = list.rule_type().as_str(), error = %e, "refresh after write failed");
        }
    }

    fn report_success(
        &self,
        operation: Operation,
        rule_id: Option<RuleId>,
        rule_type: Option<RuleType>,
    ) {
        info!(%operation, ?rule_id, ?rule_type, "operation succeeded");
        if let Some(logger) = &self.logger {
            logger.record(event(operation, "operation_succeeded", rule_id, rule_type));
        }
        let message = self.messages.text(&MessageKey::OperationSucceeded(operation));
        self.notifier.notify(Notification::success(operation, message));
    }

    fn report_failure(
        &self,
        operation: Operation,
        failure: &Error,
        rule_id: Option<RuleId>,
        rule_type: Option<RuleType>,
    ) {
        error!(%operation, ?rule_id, ?rule_type, error = %failure, "operation failed");
        if let Some(logger) = &self.logger {
            logger.record(
                event(operation, "operation_failed", rule_id, rule_type)
                    .with_error(failure.to_string()),
            );
        }
        let message = self.messages.text(&MessageKey::OperationFailed(operation));
        self.notifier.notify(Notification::failure(operation, message));
    }
}

fn event(
    operation: Operation,
    name: &str,
    rule_id: Option<RuleId>,
    rule_type: Option<RuleType>,
) -> LogEvent {
    let mut event = LogEvent::new(name).with_operation(operation);
    if let Some(id) = rule_id {
        event = event.with_rule(id);
    }
    if let Some(rule_type) = rule_type {
        event = event.with_rule_type(rule_type);
    }
    event
}

fn ensure_no_draft(list: &RuleList) -> Result<()> {
    if list.actions_enabled() {
        Ok(())
    } else {
        Err(Error::OrderDraftPending)
    }
}

/// Await `request` unless `token` is cancelled first
async fn cancellable<T>(token: &CancellationToken, request: impl Future<Output = T>) -> Result<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        output = request => {
            if token.is_cancelled() {
                Err(Error::Cancelled)
            } else {
                Ok(output)
            }
        }
    }
}
