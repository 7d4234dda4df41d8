//! Rule form controller
//!
//! In-memory editing state of one rule: name, match policy, conditions and
//! consequent, plus the snapshot the form was opened with. Conditions are
//! addressed by `ConditionId`; positions only matter when a payload is
//! built or a server error is applied.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::rule::{normalize_rule_name, MAX_CONDITIONS, MAX_NAME_LENGTH, MIN_CONDITIONS};
use crate::domain::{
    operators_for, AgentId, BotAgent, ChannelType, Condition, ConditionErrorType, ConditionId, ConditionType,
    Conditional, ConsequentField, ConsequentType, FieldError, GroupId, MatchPolicy, NewRule,
    Operator, PriorityLevel, Rule, RuleError, RuleId, RuleType, RuleUpdate,
};
use crate::ports::MessageCatalog;

use super::catalog::KeyCatalog;
use super::consequent::{transition, ConsequentDraft, ConsequentErrors, ConsequentValue};
use super::server_errors::ReconciledErrors;
use super::value_resolver::{validate_value, ValueControl, ValueResolver};

/// One condition row of the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionSlot {
    pub id: ConditionId,
    pub key: Option<String>,
    pub operator: Operator,
    pub value: Option<String>,
}

impl ConditionSlot {
    fn empty() -> Self {
        Self {
            id: ConditionId::new(),
            key: None,
            operator: Operator::Is,
            value: None,
        }
    }

    fn from_condition(condition: &Condition) -> Self {
        Self {
            id: ConditionId::new(),
            key: Some(condition.key.clone()),
            operator: condition.operator,
            value: condition.value.clone(),
        }
    }

    fn shape(&self) -> (Option<String>, Operator, Option<String>) {
        (self.key.clone(), self.operator, self.value.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "ruleId", rename_all = "camelCase")]
pub enum FormMode {
    /// Drafting a rule that does not exist yet
    Creating,
    Editing(RuleId),
}

/// What the form looked like when it was opened or last saved
#[derive(Debug, Clone, PartialEq, Eq)]
struct FormSnapshot {
    name: String,
    match_policy: MatchPolicy,
    conditions: Vec<(Option<String>, Operator, Option<String>)>,
    consequent: ConsequentValue,
}

impl FormSnapshot {
    fn capture(
        name: &str,
        match_policy: MatchPolicy,
        conditions: &[ConditionSlot],
        consequent: &ConsequentDraft,
    ) -> Self {
        Self {
            name: name.trim().to_string(),
            match_policy,
            conditions: conditions.iter().map(ConditionSlot::shape).collect(),
            consequent: consequent.value(),
        }
    }
}

/// Client-side errors of one condition row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionErrors {
    pub key: Option<FieldError>,
    pub operator: Option<FieldError>,
    pub value: Option<FieldError>,
}

impl ConditionErrors {
    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.operator.is_none() && self.value.is_none()
    }
}

/// Result of validating the whole form locally
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValidation {
    pub name: Option<FieldError>,
    pub condition_count: Option<FieldError>,
    pub conditions: Vec<(ConditionId, ConditionErrors)>,
    pub consequent: ConsequentErrors,
}

impl FormValidation {
    pub fn is_valid(&self) -> bool {
        self.name.is_none()
            && self.condition_count.is_none()
            && self.conditions.iter().all(|(_, e)| e.is_empty())
            && self.consequent.is_empty()
    }

    pub fn condition(&self, id: ConditionId) -> Option<&ConditionErrors> {
        self.conditions
            .iter()
            .find(|(condition_id, _)| *condition_id == id)
            .map(|(_, errors)| errors)
    }
}

/// Body of a create or update request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RulePayload {
    #[serde(skip)]
    pub rule_type: RuleType,
    pub name: String,
    pub conditional: Conditional,
}

impl RulePayload {
    pub fn into_new_rule(self) -> NewRule {
        NewRule {
            rule_type: self.rule_type,
            name: self.name,
            conditional: self.conditional,
        }
    }

    pub fn into_update(self, id: RuleId) -> RuleUpdate {
        RuleUpdate::new(id)
            .with_name(self.name)
            .with_conditional(self.conditional)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OperatorOption {
    pub operator: Operator,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionView {
    pub id: ConditionId,
    /// "If" for the first row, then the match policy's conjunction
    pub prefix: String,
    pub key: Option<String>,
    pub key_name: Option<String>,
    pub operator: Operator,
    pub operator_label: Option<String>,
    pub operators: Vec<OperatorOption>,
    pub value: Option<String>,
    pub control: Option<ValueControl>,
    pub key_error: Option<String>,
    pub operator_error: Option<String>,
    pub value_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsequentView {
    pub consequent_type: ConsequentType,
    /// Priority rules have a fixed consequent type
    pub type_switchable: bool,
    pub group: Option<GroupId>,
    pub agent: Option<AgentId>,
    pub priority: Option<PriorityLevel>,
    pub group_error: Option<String>,
    pub agent_error: Option<String>,
    pub priority_error: Option<String>,
}

/// Everything the presentation layer needs to render the form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub mode: FormMode,
    pub rule_type: RuleType,
    pub name: String,
    pub name_error: Option<String>,
    pub match_policy: MatchPolicy,
    pub conditions: Vec<ConditionView>,
    pub conditions_error: Option<String>,
    pub can_add_condition: bool,
    pub consequent: ConsequentView,
    pub can_submit: bool,
    pub is_dirty: bool,
}

/// Editing state machine for one rule
#[derive(Debug, Clone)]
pub struct RuleForm {
    mode: FormMode,
    rule_type: RuleType,
    catalog: Arc<KeyCatalog>,
    name: String,
    match_policy: MatchPolicy,
    conditions: Vec<ConditionSlot>,
    consequent: ConsequentDraft,
    server_errors: ReconciledErrors,
    snapshot: FormSnapshot,
}

impl RuleForm {
    /// Blank form with a single empty condition
    pub fn new_rule(rule_type: RuleType, catalog: Arc<KeyCatalog>) -> Self {
        let conditions = vec![ConditionSlot::empty()];
        let consequent = ConsequentDraft::empty(rule_type);
        let snapshot = FormSnapshot::capture("", MatchPolicy::All, &conditions, &consequent);
        Self {
            mode: FormMode::Creating,
            rule_type,
            catalog,
            name: String::new(),
            match_policy: MatchPolicy::All,
            conditions,
            consequent,
            server_errors: ReconciledErrors::default(),
            snapshot,
        }
    }

    /// Form for an existing rule. `agent` is the resolved bot of a
    /// team-with-bot consequent; errors stored on the rule are reconciled.
    pub fn from_rule(rule: &Rule, agent: Option<BotAgent>, catalog: Arc<KeyCatalog>) -> Self {
        let conditions: Vec<ConditionSlot> = rule
            .conditional
            .conditions
            .iter()
            .map(ConditionSlot::from_condition)
            .collect();
        let consequent = ConsequentDraft::from_consequent(&rule.conditional.consequent, agent);
        let ids: Vec<ConditionId> = conditions.iter().map(|c| c.id).collect();
        let server_errors = rule
            .error
            .as_ref()
            .map(|error| ReconciledErrors::apply(&ids, error))
            .unwrap_or_default();
        let snapshot = FormSnapshot::capture(
            &rule.name,
            rule.conditional.match_policy,
            &conditions,
            &consequent,
        );
        Self {
            mode: FormMode::Editing(rule.id),
            rule_type: rule.rule_type,
            catalog,
            name: rule.name.clone(),
            match_policy: rule.conditional.match_policy,
            conditions,
            consequent,
            server_errors,
            snapshot,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn match_policy(&self) -> MatchPolicy {
        self.match_policy
    }

    pub fn conditions(&self) -> &[ConditionSlot] {
        &self.conditions
    }

    pub fn consequent(&self) -> &ConsequentDraft {
        &self.consequent
    }

    pub fn catalog(&self) -> &KeyCatalog {
        &self.catalog
    }

    fn condition_ids(&self) -> Vec<ConditionId> {
        self.conditions.iter().map(|c| c.id).collect()
    }

    /// Pending server errors in positional form
    pub fn server_error(&self) -> Option<RuleError> {
        self.server_errors.to_rule_error(&self.condition_ids())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_match(&mut self, policy: MatchPolicy) {
        self.match_policy = policy;
    }

    pub fn add_condition(&mut self) -> Result<ConditionId> {
        if self.conditions.len() >= MAX_CONDITIONS {
            return Err(Error::validation(format!(
                "a rule can have at most {} conditions",
                MAX_CONDITIONS
            )));
        }
        let slot = ConditionSlot::empty();
        let id = slot.id;
        self.conditions.push(slot);
        Ok(id)
    }

    /// Remove a condition. Removing the last one is allowed; the form then
    /// fails validation until a condition is added back.
    pub fn remove_condition(&mut self, id: ConditionId) -> Result<()> {
        let index = self.position(id)?;
        self.conditions.remove(index);
        self.server_errors.clear_condition(id);
        debug!(%id, index, "removed condition");
        Ok(())
    }

    /// Select a key. A different key resets operator to `Is` and clears the value.
    pub fn set_condition_key(&mut self, id: ConditionId, key: &str) -> Result<()> {
        if self.catalog.selectable(key).is_none() {
            return Err(Error::validation(format!(
                "'{}' cannot be used as a condition key",
                key
            )));
        }
        let slot = self.slot_mut(id)?;
        if slot.key.as_deref() == Some(key) {
            return Ok(());
        }
        slot.key = Some(key.to_string());
        slot.operator = Operator::Is;
        slot.value = None;
        self.server_errors.clear_condition(id);
        Ok(())
    }

    pub fn set_condition_operator(&mut self, id: ConditionId, operator: Operator) -> Result<()> {
        let condition_type = self.slot_type(id)?;
        if !operator.is_legal_for(condition_type) {
            return Err(Error::validation(format!(
                "{} is not allowed for {} keys",
                operator.as_str(),
                condition_type.as_str()
            )));
        }
        let slot = self.slot_mut(id)?;
        slot.operator = operator;
        if operator.is_valueless() {
            slot.value = None;
            self.server_errors
                .clear_condition_part(id, ConditionErrorType::Value);
        }
        self.server_errors
            .clear_condition_part(id, ConditionErrorType::Operator);
        Ok(())
    }

    /// Set the value. Dropdown keys only take one of their options.
    pub fn set_condition_value(&mut self, id: ConditionId, value: Option<String>) -> Result<()> {
        let index = self.position(id)?;
        let slot = &self.conditions[index];
        if slot.operator.is_valueless() {
            return Err(Error::validation(format!(
                "{} takes no value",
                slot.operator.as_str()
            )));
        }
        if let (Some(key), Some(value)) = (slot.key.as_deref(), value.as_deref()) {
            self.check_option(key, value.trim())?;
        }
        let slot = &mut self.conditions[index];
        slot.value = value;
        self.server_errors
            .clear_condition_part(id, ConditionErrorType::Value);
        Ok(())
    }

    /// Switch the consequent type; all targets are reset
    pub fn set_consequent_type(&mut self, consequent_type: ConsequentType) -> Result<()> {
        if self.consequent.consequent_type() == consequent_type {
            return Ok(());
        }
        self.consequent = transition(&self.consequent, consequent_type, self.rule_type)?;
        self.server_errors.clear_consequent();
        Ok(())
    }

    pub fn set_group(&mut self, group: GroupId) -> Result<()> {
        self.consequent.set_group(group)?;
        self.server_errors.clear_consequent_field(ConsequentField::Group);
        if self.consequent.agent().is_none() {
            self.server_errors.clear_consequent_field(ConsequentField::Agent);
        }
        Ok(())
    }

    pub fn set_agent(&mut self, agent: BotAgent) -> Result<()> {
        self.consequent.set_agent(agent)?;
        self.server_errors.clear_consequent_field(ConsequentField::Agent);
        Ok(())
    }

    pub fn set_priority(&mut self, priority: PriorityLevel) -> Result<()> {
        self.consequent.set_priority(priority)?;
        self.server_errors
            .clear_consequent_field(ConsequentField::Priority);
        Ok(())
    }

    /// Replace pending server errors with those of a rejected submit
    pub fn apply_server_error(&mut self, error: &RuleError) {
        self.server_errors = ReconciledErrors::apply(&self.condition_ids(), error);
        debug!(
            conditions = error.conditions.len(),
            consequent = error.consequent.is_some(),
            "applied server error to form"
        );
    }

    /// Record a successful save: the saved state becomes the new snapshot
    pub fn mark_saved(&mut self, rule: &Rule) {
        self.mode = FormMode::Editing(rule.id);
        self.server_errors = ReconciledErrors::default();
        self.snapshot = self.capture();
    }

    fn capture(&self) -> FormSnapshot {
        FormSnapshot::capture(
            &self.name,
            self.match_policy,
            &self.conditions,
            &self.consequent,
        )
    }

    /// Whether the form differs from the state it was opened (or last saved) with
    pub fn is_dirty(&self) -> bool {
        self.snapshot != self.capture()
    }

    /// Closing a dirty form discards changes and needs the user's confirmation
    pub fn needs_close_confirmation(&self) -> bool {
        self.is_dirty()
    }

    /// Local validation of every field
    pub fn validate(&self) -> Result<FormValidation> {
        let trimmed = self.name.trim();
        let name = if trimmed.is_empty() {
            Some(FieldError::Required)
        } else if trimmed.chars().count() > MAX_NAME_LENGTH {
            Some(FieldError::TooLong {
                max: MAX_NAME_LENGTH,
            })
        } else {
            None
        };

        let condition_count = if self.conditions.len() < MIN_CONDITIONS {
            Some(FieldError::TooFewConditions {
                min: MIN_CONDITIONS,
            })
        } else if self.conditions.len() > MAX_CONDITIONS {
            Some(FieldError::TooManyConditions {
                max: MAX_CONDITIONS,
            })
        } else {
            None
        };

        let conditions = self
            .conditions
            .iter()
            .map(|slot| Ok((slot.id, self.validate_condition(slot)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(FormValidation {
            name,
            condition_count,
            conditions,
            consequent: self.consequent.validate(),
        })
    }

    fn validate_condition(&self, slot: &ConditionSlot) -> Result<ConditionErrors> {
        let mut errors = ConditionErrors::default();
        let Some(key) = slot.key.as_deref() else {
            errors.key = Some(FieldError::Required);
            return Ok(errors);
        };
        let Some(entry) = self.catalog.selectable(key) else {
            errors.key = Some(FieldError::UnknownKey);
            return Ok(errors);
        };
        let condition_type = entry
            .condition_type()
            .ok_or_else(|| Error::invariant(format!("selectable key '{}' has no type", key)))?;
        if !slot.operator.is_legal_for(condition_type) {
            errors.operator = Some(FieldError::OperatorNotAllowed);
            return Ok(errors);
        }
        errors.value = validate_value(entry, slot.operator, slot.value.as_deref(), &self.consequent)?;
        Ok(errors)
    }

    /// Whether submit is enabled.
    ///
    /// A new rule must be fully valid. An existing rule must also have
    /// changed since it was opened.
    pub fn can_submit(&self) -> Result<bool> {
        let validation = self.validate()?;
        Ok(self.submit_enabled(&validation))
    }

    fn submit_enabled(&self, validation: &FormValidation) -> bool {
        if !validation.is_valid() {
            return false;
        }
        match self.mode {
            FormMode::Creating => true,
            FormMode::Editing(_) => self.is_dirty(),
        }
    }

    /// Build the request body: trimmed name plus the conditional in row order
    pub fn payload(&self) -> Result<RulePayload> {
        let validation = self.validate()?;
        if let Some(error) = &validation.condition_count {
            return Err(Error::validation(match error {
                FieldError::TooFewConditions { min } => {
                    format!("a rule needs at least {} condition", min)
                }
                _ => format!("a rule can have at most {} conditions", MAX_CONDITIONS),
            }));
        }
        if !validation.is_valid() {
            return Err(Error::validation("the rule form has errors"));
        }

        let name = normalize_rule_name(&self.name).map_err(Error::validation)?;
        let conditions = self
            .conditions
            .iter()
            .map(|slot| self.to_condition(slot))
            .collect::<Result<Vec<_>>>()?;
        let consequent = self
            .consequent
            .to_consequent()
            .ok_or_else(|| Error::invariant("validated consequent has unset targets"))?;

        Ok(RulePayload {
            rule_type: self.rule_type,
            name,
            conditional: Conditional {
                match_policy: self.match_policy,
                conditions,
                consequent,
            },
        })
    }

    fn to_condition(&self, slot: &ConditionSlot) -> Result<Condition> {
        let key = slot
            .key
            .clone()
            .ok_or_else(|| Error::invariant("validated condition has no key"))?;
        let condition_type = self
            .catalog
            .condition_type(&key)
            .ok_or_else(|| Error::invariant(format!("'{}' left the catalog", key)))?;
        let value = if slot.operator.is_valueless() {
            None
        } else {
            slot.value.clone()
        };
        Ok(Condition::new(key, condition_type, slot.operator, value))
    }

    /// Render state. Client errors win over server errors on the same field.
    pub fn view(&self, messages: &dyn MessageCatalog) -> Result<FormView> {
        let validation = self.validate()?;
        let resolver = ValueResolver::new(&self.catalog, messages);
        let server = |reason: &str| {
            messages.field_error(&FieldError::Server {
                reason: reason.to_string(),
            })
        };
        let client = |error: &Option<FieldError>| error.as_ref().map(|e| messages.field_error(e));

        let mut conditions = Vec::with_capacity(self.conditions.len());
        for (index, slot) in self.conditions.iter().enumerate() {
            let errors = validation.condition(slot.id).cloned().unwrap_or_default();
            let entry = slot.key.as_deref().and_then(|k| self.catalog.selectable(k));
            let condition_type: Option<ConditionType> = entry.and_then(|e| e.condition_type());

            let operators = condition_type
                .map(|ty| {
                    operators_for(ty)
                        .iter()
                        .map(|op| OperatorOption {
                            operator: *op,
                            label: messages.operator_label(*op, ty),
                        })
                        .collect()
                })
                .unwrap_or_default();
            let control = match (slot.key.as_deref(), condition_type) {
                (Some(key), Some(ty)) if slot.operator.is_legal_for(ty) => {
                    Some(resolver.resolve_control(key, slot.operator, &self.consequent)?)
                }
                _ => None,
            };
            let server_part = |part: ConditionErrorType| self.server_errors.condition_error(slot.id, part).map(server);

            conditions.push(ConditionView {
                id: slot.id,
                prefix: messages.condition_prefix(index, self.match_policy),
                key: slot.key.clone(),
                key_name: entry.map(|e| e.name.clone()),
                operator: slot.operator,
                operator_label: condition_type.map(|ty| messages.operator_label(slot.operator, ty)),
                operators,
                value: slot.value.clone(),
                control,
                key_error: client(&errors.key)
                    .or_else(|| server_part(ConditionErrorType::Key))
                    .or_else(|| server_part(ConditionErrorType::Type)),
                operator_error: client(&errors.operator)
                    .or_else(|| server_part(ConditionErrorType::Operator)),
                value_error: client(&errors.value)
                    .or_else(|| server_part(ConditionErrorType::Value)),
            });
        }

        let server_consequent =
            |field: ConsequentField| self.server_errors.consequent_field_error(field).map(server);
        let consequent = ConsequentView {
            consequent_type: self.consequent.consequent_type(),
            type_switchable: self.rule_type == RuleType::Assignment,
            group: self.consequent.group(),
            agent: self.consequent.agent().map(|a| a.id),
            priority: self.consequent.priority(),
            group_error: client(&validation.consequent.group)
                .or_else(|| server_consequent(ConsequentField::Group)),
            agent_error: client(&validation.consequent.agent)
                .or_else(|| server_consequent(ConsequentField::Agent)),
            priority_error: client(&validation.consequent.priority)
                .or_else(|| server_consequent(ConsequentField::Priority)),
        };

        Ok(FormView {
            mode: self.mode,
            rule_type: self.rule_type,
            name: self.name.clone(),
            name_error: client(&validation.name),
            match_policy: self.match_policy,
            conditions,
            conditions_error: client(&validation.condition_count),
            can_add_condition: self.conditions.len() < MAX_CONDITIONS,
            consequent,
            can_submit: self.submit_enabled(&validation),
            is_dirty: self.is_dirty(),
        })
    }

    fn position(&self, id: ConditionId) -> Result<usize> {
        self.conditions
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::not_found(format!("condition {}", id)))
    }

    fn check_option(&self, key: &str, value: &str) -> Result<()> {
        let Some(entry) = self.catalog.selectable(key) else {
            return Ok(());
        };
        if value.is_empty() || entry.condition_type() != Some(ConditionType::Dropdown) {
            return Ok(());
        }
        let known = if entry.is_channel_type() {
            ChannelType::parse(value).is_some()
        } else {
            entry.options.iter().any(|o| o == value)
        };
        if known {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "'{}' is not an option of {}",
                value, entry.name
            )))
        }
    }

    fn slot_mut(&mut self, id: ConditionId) -> Result<&mut ConditionSlot> {
        let index = self.position(id)?;
        Ok(&mut self.conditions[index])
    }

    fn slot_type(&self, id: ConditionId) -> Result<ConditionType> {
        let slot = &self.conditions[self.position(id)?];
        let key = slot
            .key
            .as_deref()
            .ok_or_else(|| Error::validation("select a key before choosing an operator"))?;
        self.catalog
            .condition_type(key)
            .ok_or_else(|| Error::validation(format!("'{}' is not a known condition key", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::messages::EnglishMessages;
    use crate::domain::{BotType, Consequent, CustomField, CustomFieldType, RuleStatus};
    use crate::services::catalog::{CHANNEL_TYPE_KEY, CUSTOMER_ID_KEY, CUSTOMER_NAME_KEY};

    fn catalog() -> Arc<KeyCatalog> {
        Arc::new(KeyCatalog::build(
            &[
                CustomField::new("plan", "Plan", CustomFieldType::Dropdown)
                    .with_options(["free", "pro"]),
                CustomField::new("seats", "Seats", CustomFieldType::Integer),
            ],
            &[],
            &EnglishMessages,
        ))
    }

    fn first(form: &RuleForm) -> ConditionId {
        form.conditions()[0].id
    }

    fn valid_group_form() -> RuleForm {
        let mut form = RuleForm::new_rule(RuleType::Assignment, catalog());
        form.set_name("  VIP customers  ");
        let id = first(&form);
        form.set_condition_key(id, CUSTOMER_ID_KEY).unwrap();
        form.set_condition_value(id, Some("42".into())).unwrap();
        form.set_group(3).unwrap();
        form
    }

    fn saved_rule() -> Rule {
        Rule {
            id: 7,
            name: "VIP".to_string(),
            rule_type: RuleType::Assignment,
            status: RuleStatus::On,
            order: 1,
            conditional: Conditional {
                match_policy: MatchPolicy::All,
                conditions: vec![
                    Condition::new(CUSTOMER_ID_KEY, ConditionType::Text, Operator::Is, Some("1".into())),
                    Condition::new(CUSTOMER_NAME_KEY, ConditionType::Text, Operator::Contains, Some("a".into())),
                    Condition::new("ticket.customFields.seats", ConditionType::Number, Operator::GreaterThan, Some("5".into())),
                ],
                consequent: Consequent::Group { group: 3 },
            },
            error: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_scenario_a_required_value_unless_valueless() {
        let mut form = valid_group_form();
        let id = first(&form);

        form.set_condition_value(id, Some("   ".into())).unwrap();
        let validation = form.validate().unwrap();
        assert_eq!(validation.condition(id).unwrap().value, Some(FieldError::Required));
        assert!(!form.can_submit().unwrap());

        form.set_condition_operator(id, Operator::HasAnyValue).unwrap();
        let validation = form.validate().unwrap();
        assert!(validation.condition(id).unwrap().is_empty());
        assert!(form.can_submit().unwrap());
        assert_eq!(form.payload().unwrap().conditional.conditions[0].value, None);
    }

    #[test]
    fn test_unknown_dropdown_value_is_rejected() {
        let mut form = RuleForm::new_rule(RuleType::Assignment, catalog());
        form.set_name("Channels");
        let id = first(&form);
        form.set_condition_key(id, CHANNEL_TYPE_KEY).unwrap();

        let err = form.set_condition_value(id, Some("EMAIL".into())).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(form.conditions()[0].value, None);

        // the form still validates and renders
        let validation = form.validate().unwrap();
        assert_eq!(validation.condition(id).unwrap().value, Some(FieldError::Required));
        assert!(form.view(&EnglishMessages).is_ok());

        let plan = form.add_condition().unwrap();
        form.set_condition_key(plan, "ticket.customFields.plan").unwrap();
        assert!(form.set_condition_value(plan, Some("gold".into())).is_err());
        form.set_condition_value(plan, Some("pro".into())).unwrap();
        form.set_condition_value(id, Some("FACEBOOK_FEED".into())).unwrap();
        let validation = form.validate().unwrap();
        assert!(validation.condition(id).unwrap().is_empty());
        assert!(validation.condition(plan).unwrap().is_empty());
    }

    #[test]
    fn test_scenario_b_bot_channel_error_clears_on_consequent_change() {
        let mut form = RuleForm::new_rule(RuleType::Assignment, catalog());
        form.set_name("Bot routing");
        let id = first(&form);
        form.set_condition_key(id, CHANNEL_TYPE_KEY).unwrap();
        form.set_condition_value(id, Some("FACEBOOK_FEED".into())).unwrap();
        form.set_consequent_type(ConsequentType::GroupWithBotAgent).unwrap();
        form.set_group(1).unwrap();
        form.set_agent(BotAgent {
            id: 5,
            bot_type: Some(BotType::Custom),
            group_ids: vec![1],
        })
        .unwrap();

        let validation = form.validate().unwrap();
        assert_eq!(
            validation.condition(id).unwrap().value,
            Some(FieldError::UnsupportedByCustomBot)
        );
        assert!(!form.can_submit().unwrap());

        form.set_consequent_type(ConsequentType::Group).unwrap();
        let validation = form.validate().unwrap();
        assert_eq!(validation.condition(id).unwrap().value, None);
        assert_eq!(form.conditions()[0].value.as_deref(), Some("FACEBOOK_FEED"));
        assert!(form.consequent().group().is_none());
    }

    #[test]
    fn test_scenario_d_condition_bounds() {
        let mut form = valid_group_form();
        form.remove_condition(first(&form)).unwrap();
        assert_eq!(
            form.validate().unwrap().condition_count,
            Some(FieldError::TooFewConditions { min: 1 })
        );
        assert!(form.payload().is_err());

        for _ in 0..MAX_CONDITIONS {
            form.add_condition().unwrap();
        }
        assert!(form.add_condition().is_err());
        assert_eq!(form.conditions().len(), MAX_CONDITIONS);
    }

    #[test]
    fn test_key_change_resets_operator_and_value() {
        let mut form = valid_group_form();
        let id = first(&form);
        form.set_condition_operator(id, Operator::Contains).unwrap();
        form.set_condition_value(id, Some("abc".into())).unwrap();

        form.set_condition_key(id, "ticket.customFields.seats").unwrap();
        let slot = &form.conditions()[0];
        assert_eq!(slot.operator, Operator::Is);
        assert_eq!(slot.value, None);
    }

    #[test]
    fn test_headers_cannot_be_selected() {
        let mut form = valid_group_form();
        let id = first(&form);
        assert!(form.set_condition_key(id, "$ticket").is_err());
        assert!(form.set_condition_key(id, "ticket.customFields.gone").is_err());
    }

    #[test]
    fn test_operator_must_fit_key_type() {
        let mut form = valid_group_form();
        let id = first(&form);
        form.set_condition_key(id, CHANNEL_TYPE_KEY).unwrap();
        assert!(form.set_condition_operator(id, Operator::Contains).is_err());
        assert!(form.set_condition_operator(id, Operator::IsNot).is_ok());
    }

    #[test]
    fn test_payload_trims_name() {
        let payload = valid_group_form().payload().unwrap();
        assert_eq!(payload.name, "VIP customers");
        assert_eq!(payload.conditional.consequent, Consequent::Group { group: 3 });
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("rule_type").is_none());
        assert_eq!(json["conditional"]["match"], "ALL");
    }

    #[test]
    fn test_editing_requires_a_change() {
        let mut form = RuleForm::from_rule(&saved_rule(), None, catalog());
        assert_eq!(form.mode(), FormMode::Editing(7));
        assert!(!form.is_dirty());
        assert!(!form.can_submit().unwrap());

        form.set_match(MatchPolicy::Any);
        assert!(form.is_dirty());
        assert!(form.can_submit().unwrap());

        form.set_match(MatchPolicy::All);
        assert!(!form.can_submit().unwrap());
    }

    #[test]
    fn test_editing_condition_change_must_be_complete() {
        let mut form = RuleForm::from_rule(&saved_rule(), None, catalog());
        let added = form.add_condition().unwrap();
        assert!(form.is_dirty());
        assert!(!form.can_submit().unwrap());

        form.set_condition_key(added, CUSTOMER_NAME_KEY).unwrap();
        form.set_condition_value(added, Some("Ann".into())).unwrap();
        assert!(form.can_submit().unwrap());
    }

    #[test]
    fn test_removing_condition_keeps_server_errors_aligned() {
        let mut rule = saved_rule();
        rule.error = Some(
            RuleError::default()
                .with_condition(0, ConditionErrorType::Value, "first")
                .with_condition(2, ConditionErrorType::Value, "third"),
        );
        let mut form = RuleForm::from_rule(&rule, None, catalog());
        let second = form.conditions()[1].id;
        form.remove_condition(second).unwrap();

        let record = form.server_error().unwrap();
        let positions: Vec<(usize, &str)> = record
            .conditions
            .iter()
            .map(|e| (e.index, e.reason.as_str()))
            .collect();
        assert_eq!(positions, vec![(0, "first"), (1, "third")]);

        let third = form.conditions()[1].id;
        form.set_condition_key(third, CUSTOMER_ID_KEY).unwrap();
        let first = form.conditions()[0].id;
        form.set_condition_value(first, Some("2".into())).unwrap();
        assert!(form.server_error().is_none());
    }

    #[test]
    fn test_consequent_type_change_clears_consequent_server_error() {
        let mut form = valid_group_form();
        form.apply_server_error(
            &RuleError::default().with_consequent(ConsequentField::Group, "Team was deleted"),
        );
        let view = form.view(&EnglishMessages).unwrap();
        assert_eq!(view.consequent.group_error.as_deref(), Some("Team was deleted"));
        // Server errors do not block submit
        assert!(view.can_submit);

        form.set_consequent_type(ConsequentType::GroupWithBotAgent).unwrap();
        assert!(form.server_error().is_none());
    }

    #[test]
    fn test_client_errors_take_precedence_in_view() {
        let mut form = valid_group_form();
        let id = first(&form);
        form.apply_server_error(
            &RuleError::default().with_condition(0, ConditionErrorType::Key, "Field was deleted"),
        );
        form.set_condition_value(id, None).unwrap();

        let view = form.view(&EnglishMessages).unwrap();
        let row = &view.conditions[0];
        assert_eq!(row.key_error.as_deref(), Some("Field was deleted"));
        assert_eq!(row.value_error.as_deref(), Some("This field is required."));
        assert_eq!(row.prefix, "If");
        assert!(row.control.is_some());
    }

    #[test]
    fn test_condition_prefixes_follow_match_policy() {
        let mut form = valid_group_form();
        form.add_condition().unwrap();
        form.set_match(MatchPolicy::Any);
        let view = form.view(&EnglishMessages).unwrap();
        assert_eq!(view.conditions[0].prefix, "If");
        assert_eq!(view.conditions[1].prefix, "or");
    }

    #[test]
    fn test_priority_forms_cannot_switch_type() {
        let mut form = RuleForm::new_rule(RuleType::Priority, catalog());
        assert!(form.set_consequent_type(ConsequentType::Group).is_err());
        assert!(form.set_group(1).is_err());
        form.set_priority(PriorityLevel::Urgent).unwrap();
        let view = form.view(&EnglishMessages).unwrap();
        assert!(!view.consequent.type_switchable);
        assert_eq!(view.consequent.priority, Some(PriorityLevel::Urgent));
    }

    #[test]
    fn test_mark_saved_resets_dirty_state() {
        let mut form = valid_group_form();
        assert!(form.needs_close_confirmation());
        form.mark_saved(&saved_rule());
        assert!(!form.is_dirty());
        assert_eq!(form.mode(), FormMode::Editing(7));
    }
}
