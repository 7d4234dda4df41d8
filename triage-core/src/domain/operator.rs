//! Comparison operators and the per-type operator table

use serde::{Deserialize, Serialize};

use super::condition::ConditionType;

/// A comparison operator used by a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Is,
    IsNot,
    StartsWith,
    EndsWith,
    Contains,
    DoesNotContain,
    GreaterThan,
    LessThan,
    IsEmpty,
    HasAnyValue,
    IsUnknown,
}

const TEXT_OPERATORS: &[Operator] = &[
    Operator::Is,
    Operator::IsNot,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::Contains,
    Operator::DoesNotContain,
    Operator::IsEmpty,
    Operator::HasAnyValue,
    Operator::IsUnknown,
];

const NUMBER_OPERATORS: &[Operator] = &[
    Operator::Is,
    Operator::IsNot,
    Operator::GreaterThan,
    Operator::LessThan,
    Operator::HasAnyValue,
    Operator::IsUnknown,
];

const DROPDOWN_OPERATORS: &[Operator] = &[
    Operator::Is,
    Operator::IsNot,
    Operator::HasAnyValue,
    Operator::IsUnknown,
];

/// Operators that take no value
pub const VALUELESS_OPERATORS: &[Operator] =
    &[Operator::IsEmpty, Operator::HasAnyValue, Operator::IsUnknown];

/// Legal operators for a condition type, in display order
pub fn operators_for(condition_type: ConditionType) -> &'static [Operator] {
    match condition_type {
        ConditionType::Text => TEXT_OPERATORS,
        ConditionType::Number => NUMBER_OPERATORS,
        ConditionType::Dropdown => DROPDOWN_OPERATORS,
    }
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Is => "IS",
            Operator::IsNot => "IS_NOT",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::Contains => "CONTAINS",
            Operator::DoesNotContain => "DOES_NOT_CONTAIN",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::LessThan => "LESS_THAN",
            Operator::IsEmpty => "IS_EMPTY",
            Operator::HasAnyValue => "HAS_ANY_VALUE",
            Operator::IsUnknown => "IS_UNKNOWN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_uppercase().replace(['-', ' '], "_");
        [TEXT_OPERATORS, NUMBER_OPERATORS]
            .concat()
            .into_iter()
            .find(|op| op.as_str() == normalized)
    }

    /// Whether the value field is hidden and not required for this operator
    pub fn is_valueless(&self) -> bool {
        VALUELESS_OPERATORS.contains(self)
    }

    pub fn requires_value(&self) -> bool {
        !self.is_valueless()
    }

    pub fn is_legal_for(&self, condition_type: ConditionType) -> bool {
        operators_for(condition_type).contains(self)
    }

    /// `Is`/`IsNot` read differently against numbers ("is equal to")
    pub fn uses_numeric_phrasing(&self, condition_type: ConditionType) -> bool {
        condition_type == ConditionType::Number
            && matches!(self, Operator::Is | Operator::IsNot)
    }
}
