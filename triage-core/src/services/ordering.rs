//! Rule ordering engine
//!
//! `RuleList` keeps the last-fetched rules of one type in an arena together
//! with a draft order. Moves only touch the draft; saving sends the draft,
//! cancelling copies the committed orders back.

use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{Rule, RuleId, RuleOrder, RuleType};

/// Move the rule at position `start` to position `end` (1-based orders).
///
/// Rules strictly between the two positions, plus the one at `end`, shift by
/// one towards `start`. Expects dense orders `1..=n`.
pub fn reorder(orders: &[RuleOrder], start: u32, end: u32) -> Result<Vec<RuleOrder>> {
    let len = orders.len() as u32;
    for (label, position) in [("start", start), ("end", end)] {
        if position == 0 || position > len {
            return Err(Error::validation(format!(
                "{} position {} is outside 1..={}",
                label, position, len
            )));
        }
    }
    if !orders.iter().any(|o| o.order == start) {
        return Err(Error::invariant(format!("no rule holds order {}", start)));
    }

    Ok(orders
        .iter()
        .map(|entry| {
            let order = entry.order;
            let moved = if order == start {
                end
            } else if start < end && order > start && order <= end {
                order - 1
            } else if start > end && order >= end && order < start {
                order + 1
            } else {
                order
            };
            RuleOrder {
                id: entry.id,
                order: moved,
            }
        })
        .collect())
}

/// Last-fetched rules of one type plus the draft order
#[derive(Debug, Clone)]
pub struct RuleList {
    rule_type: RuleType,
    /// Committed state, sorted by order
    rules: Vec<Rule>,
    /// Draft order per arena slot
    draft: Vec<RuleOrder>,
}

impl RuleList {
    pub fn new(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            rules: Vec::new(),
            draft: Vec::new(),
        }
    }

    /// Build from fetched rules
    pub fn from_rules(rule_type: RuleType, rules: Vec<Rule>) -> Self {
        let mut list = Self::new(rule_type);
        list.replace(rules);
        list
    }

    /// Replace the committed rules with a fresh fetch and drop any draft.
    ///
    /// Rules of another type are ignored. Orders that are not dense are
    /// renumbered `1..=n` keeping their relative order.
    pub fn replace(&mut self, mut rules: Vec<Rule>) {
        let before = rules.len();
        rules.retain(|r| r.rule_type == self.rule_type);
        if rules.len() != before {
            warn!(
                rule_type = self.rule_type.as_str(),
                dropped = before - rules.len(),
                "ignoring rules of another type"
            );
        }
        rules.sort_by_key(|r| (r.order, r.id));

        let dense = rules
            .iter()
            .enumerate()
            .all(|(i, r)| r.order == i as u32 + 1);
        if !dense {
            warn!(
                rule_type = self.rule_type.as_str(),
                "fetched rule orders are not dense, renumbering"
            );
            for (i, rule) in rules.iter_mut().enumerate() {
                rule.order = i as u32 + 1;
            }
        }

        self.draft = rules
            .iter()
            .map(|r| RuleOrder {
                id: r.id,
                order: r.order,
            })
            .collect();
        self.rules = rules;
    }

    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Rules in committed order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules paired with their draft position, sorted by it
    pub fn in_draft_order(&self) -> Vec<(u32, &Rule)> {
        let mut view: Vec<(u32, &Rule)> = self
            .draft
            .iter()
            .zip(&self.rules)
            .map(|(draft, rule)| (draft.order, rule))
            .collect();
        view.sort_by_key(|(order, _)| *order);
        view
    }

    /// Move a rule in the draft from position `start` to `end`
    pub fn move_rule(&mut self, start: u32, end: u32) -> Result<()> {
        self.draft = reorder(&self.draft, start, end)?;
        debug!(
            rule_type = self.rule_type.as_str(),
            start,
            end,
            dirty = self.is_order_dirty(),
            "moved rule in draft order"
        );
        Ok(())
    }

    /// Draft position of a rule
    pub fn draft_position(&self, id: RuleId) -> Option<u32> {
        self.draft.iter().find(|o| o.id == id).map(|o| o.order)
    }

    pub fn is_order_dirty(&self) -> bool {
        self.draft
            .iter()
            .zip(&self.rules)
            .any(|(draft, rule)| draft.order != rule.order)
    }

    /// Discard the draft
    pub fn cancel_order(&mut self) {
        for (draft, rule) in self.draft.iter_mut().zip(&self.rules) {
            draft.order = rule.order;
        }
    }

    /// Create, edit, delete and toggle are disabled while a draft is unsaved
    pub fn actions_enabled(&self) -> bool {
        !self.is_order_dirty()
    }

    /// Full `{id, order}` list for a save request, sorted by draft order
    pub fn order_payload(&self) -> Vec<RuleOrder> {
        let mut payload = self.draft.clone();
        payload.sort_by_key(|o| o.order);
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Condition, ConditionType, Conditional, Consequent, MatchPolicy, Operator, RuleStatus,
    };

    fn orders(values: &[u32]) -> Vec<RuleOrder> {
        values
            .iter()
            .enumerate()
            .map(|(i, order)| RuleOrder {
                id: i as RuleId + 1,
                order: *order,
            })
            .collect()
    }

    fn assignment(id: RuleId, order: u32) -> Rule {
        Rule {
            id,
            name: format!("rule {}", id),
            rule_type: RuleType::Assignment,
            status: RuleStatus::On,
            order,
            conditional: Conditional {
                match_policy: MatchPolicy::All,
                conditions: vec![Condition::new(
                    "customerId",
                    ConditionType::Text,
                    Operator::HasAnyValue,
                    None,
                )],
                consequent: Consequent::Group { group: 1 },
            },
            error: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_scenario_c_move_down() {
        let result = reorder(&orders(&[1, 2, 3, 4]), 1, 3).unwrap();
        let assigned: Vec<u32> = result.iter().map(|o| o.order).collect();
        // rule ids 1..4 held orders 1..4
        assert_eq!(assigned, vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_move_up() {
        let result = reorder(&orders(&[1, 2, 3, 4]), 4, 2).unwrap();
        let assigned: Vec<u32> = result.iter().map(|o| o.order).collect();
        assert_eq!(assigned, vec![1, 3, 4, 2]);
    }

    #[test]
    fn test_adjacent_moves() {
        let down = reorder(&orders(&[1, 2, 3]), 1, 2).unwrap();
        assert_eq!(down.iter().map(|o| o.order).collect::<Vec<_>>(), vec![2, 1, 3]);
        let up = reorder(&orders(&[1, 2, 3]), 3, 2).unwrap();
        assert_eq!(up.iter().map(|o| o.order).collect::<Vec<_>>(), vec![1, 3, 2]);
    }

    #[test]
    fn test_round_trip_restores_orders() {
        let original = orders(&[1, 2, 3, 4, 5]);
        for start in 1..=5 {
            for end in 1..=5 {
                if start == end {
                    continue;
                }
                let moved = reorder(&original, start, end).unwrap();
                let back = reorder(&moved, end, start).unwrap();
                assert_eq!(back, original, "move {} -> {}", start, end);
            }
        }
    }

    #[test]
    fn test_result_stays_dense() {
        let moved = reorder(&orders(&[1, 2, 3, 4, 5]), 2, 5).unwrap();
        let mut assigned: Vec<u32> = moved.iter().map(|o| o.order).collect();
        assigned.sort();
        assert_eq!(assigned, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_out_of_bounds() {
        assert!(reorder(&orders(&[1, 2]), 0, 1).is_err());
        assert!(reorder(&orders(&[1, 2]), 1, 3).is_err());
    }

    #[test]
    fn test_draft_dirty_and_cancel() {
        let mut list = RuleList::from_rules(
            RuleType::Assignment,
            vec![assignment(10, 1), assignment(11, 2), assignment(12, 3)],
        );
        assert!(list.actions_enabled());

        list.move_rule(1, 3).unwrap();
        assert!(list.is_order_dirty());
        assert!(!list.actions_enabled());
        let ids: Vec<RuleId> = list.in_draft_order().iter().map(|(_, r)| r.id).collect();
        assert_eq!(ids, vec![11, 12, 10]);
        assert_eq!(list.rules()[0].order, 1);

        list.cancel_order();
        assert!(!list.is_order_dirty());
        assert_eq!(list.draft_position(10), Some(1));
    }

    #[test]
    fn test_moving_back_is_not_dirty() {
        let mut list = RuleList::from_rules(
            RuleType::Assignment,
            vec![assignment(10, 1), assignment(11, 2)],
        );
        list.move_rule(1, 2).unwrap();
        list.move_rule(2, 1).unwrap();
        assert!(!list.is_order_dirty());
    }

    #[test]
    fn test_payload_is_sorted_by_draft() {
        let mut list = RuleList::from_rules(
            RuleType::Assignment,
            vec![assignment(10, 1), assignment(11, 2), assignment(12, 3)],
        );
        list.move_rule(3, 1).unwrap();
        assert_eq!(
            list.order_payload(),
            vec![
                RuleOrder { id: 12, order: 1 },
                RuleOrder { id: 10, order: 2 },
                RuleOrder { id: 11, order: 3 },
            ]
        );
    }

    #[test]
    fn test_sparse_orders_are_renumbered() {
        let list = RuleList::from_rules(
            RuleType::Assignment,
            vec![assignment(10, 7), assignment(11, 3)],
        );
        let orders: Vec<(RuleId, u32)> = list.rules().iter().map(|r| (r.id, r.order)).collect();
        assert_eq!(orders, vec![(11, 1), (10, 2)]);
    }

    #[test]
    fn test_other_types_are_ignored() {
        let mut priority = assignment(20, 1);
        priority.rule_type = RuleType::Priority;
        let list = RuleList::from_rules(RuleType::Assignment, vec![assignment(10, 1), priority]);
        assert_eq!(list.len(), 1);
        assert!(list.get(20).is_none());
    }
}
