//! Server error reconciler
//!
//! Server errors address conditions by position. The form addresses them by
//! `ConditionId`, so positions are translated once when an error arrives and
//! again only when the error record is read back positionally.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::domain::{
    ConditionError, ConditionErrorType, ConditionId, ConsequentError, ConsequentField, RuleError,
};

/// Server errors attached to the conditions and consequent of a form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciledErrors {
    conditions: HashMap<ConditionId, BTreeMap<ConditionErrorType, String>>,
    consequent: Option<ConsequentError>,
}

impl ReconciledErrors {
    /// Attach a positional server error to the conditions identified by `ids`.
    ///
    /// Errors pointing past the end of the condition list are dropped.
    pub fn apply(ids: &[ConditionId], error: &RuleError) -> Self {
        let mut reconciled = Self {
            consequent: error.consequent.clone(),
            ..Default::default()
        };
        for condition_error in &error.conditions {
            let Some(id) = ids.get(condition_error.index) else {
                warn!(
                    index = condition_error.index,
                    conditions = ids.len(),
                    "server error refers to a condition that does not exist"
                );
                continue;
            };
            reconciled
                .conditions
                .entry(*id)
                .or_default()
                .insert(condition_error.error_type, condition_error.reason.clone());
        }
        reconciled
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.consequent.is_none()
    }

    pub fn condition_error(&self, id: ConditionId, part: ConditionErrorType) -> Option<&str> {
        self.conditions
            .get(&id)
            .and_then(|parts| parts.get(&part))
            .map(String::as_str)
    }

    pub fn consequent_error(&self) -> Option<&ConsequentError> {
        self.consequent.as_ref()
    }

    /// Reason reported for one consequent field, if any
    pub fn consequent_field_error(&self, field: ConsequentField) -> Option<&str> {
        self.consequent
            .as_ref()
            .filter(|e| e.field == field)
            .map(|e| e.reason.as_str())
    }

    /// Drop every error of one condition (condition removed or its key changed)
    pub fn clear_condition(&mut self, id: ConditionId) {
        self.conditions.remove(&id);
    }

    pub fn clear_condition_part(&mut self, id: ConditionId, part: ConditionErrorType) {
        if let Some(parts) = self.conditions.get_mut(&id) {
            parts.remove(&part);
            if parts.is_empty() {
                self.conditions.remove(&id);
            }
        }
    }

    pub fn clear_consequent(&mut self) {
        self.consequent = None;
    }

    /// Clear the consequent error if it concerns `field`
    pub fn clear_consequent_field(&mut self, field: ConsequentField) {
        if self.consequent.as_ref().map(|e| e.field) == Some(field) {
            self.consequent = None;
        }
    }

    /// Positional record for the current condition order, `None` once empty
    pub fn to_rule_error(&self, ids: &[ConditionId]) -> Option<RuleError> {
        if self.is_empty() {
            return None;
        }
        let conditions = ids
            .iter()
            .enumerate()
            .filter_map(|(index, id)| self.conditions.get(id).map(|parts| (index, parts)))
            .flat_map(|(index, parts)| {
                parts.iter().map(move |(error_type, reason)| ConditionError {
                    index,
                    error_type: *error_type,
                    reason: reason.clone(),
                })
            })
            .collect();
        Some(RuleError {
            conditions,
            consequent: self.consequent.clone(),
        })
    }
}

/// Reindex a positional error record after the condition at `removed` is deleted.
///
/// Errors at `removed` are dropped and later indices move down by one. An
/// out-of-range index leaves the record untouched. Returns `None` once no
/// condition or consequent error is left.
pub fn remove_condition_errors(error: &RuleError, removed: usize) -> Option<RuleError> {
    let conditions = error
        .conditions
        .iter()
        .filter(|e| e.index != removed)
        .map(|e| ConditionError {
            index: if e.index > removed { e.index - 1 } else { e.index },
            ..e.clone()
        })
        .collect();
    let reindexed = RuleError {
        conditions,
        consequent: error.consequent.clone(),
    };
    (!reindexed.is_empty()).then_some(reindexed)
}
