//! Condition value resolver
//!
//! Decides which value control a condition shows for its key and operator,
//! what validation applies to it, and which dropdown options are legal
//! given the rule's consequent.

use regex::Regex;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::{BotType, ChannelGroup, ChannelType, ConditionType, FieldError, Operator};
use crate::ports::{MessageCatalog, MessageKey};

use super::catalog::{CatalogEntry, KeyCatalog};
use super::consequent::ConsequentDraft;

/// Validation rules of a free-text or numeric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRules {
    pub required: bool,
    pub max_length: usize,
    pub digits_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueOption {
    pub value: String,
    pub label: String,
}

/// Options shown under one heading; `label` is `None` for flat lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionGroup {
    pub label: Option<String>,
    pub options: Vec<ValueOption>,
}

/// The value control a condition row renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "spec", rename_all = "camelCase")]
pub enum ValueControl {
    /// Operator takes no value
    Hidden,
    Text(TextRules),
    Number(TextRules),
    Dropdown(Vec<OptionGroup>),
}

impl ValueControl {
    pub fn requires_value(&self) -> bool {
        !matches!(self, ValueControl::Hidden)
    }
}

/// Resolves value controls against a key catalog
pub struct ValueResolver<'a> {
    catalog: &'a KeyCatalog,
    messages: &'a dyn MessageCatalog,
}

impl<'a> ValueResolver<'a> {
    pub fn new(catalog: &'a KeyCatalog, messages: &'a dyn MessageCatalog) -> Self {
        Self { catalog, messages }
    }

    /// Control for `<key> <operator> _`
    pub fn resolve_control(
        &self,
        key: &str,
        operator: Operator,
        consequent: &ConsequentDraft,
    ) -> Result<ValueControl> {
        let entry = self
            .catalog
            .selectable(key)
            .ok_or_else(|| Error::invariant(format!("condition key '{}' is not in the catalog", key)))?;
        let condition_type = entry
            .condition_type()
            .ok_or_else(|| Error::invariant(format!("'{}' is a group header", key)))?;

        if operator.is_valueless() {
            return Ok(ValueControl::Hidden);
        }

        Ok(match condition_type {
            ConditionType::Text => ValueControl::Text(text_rules(entry, false)),
            ConditionType::Number => ValueControl::Number(text_rules(entry, true)),
            ConditionType::Dropdown if entry.is_channel_type() => {
                ValueControl::Dropdown(self.channel_options(consequent.bot_constraint()))
            }
            ConditionType::Dropdown => ValueControl::Dropdown(vec![OptionGroup {
                label: None,
                options: entry
                    .options
                    .iter()
                    .map(|o| ValueOption {
                        value: o.clone(),
                        label: o.clone(),
                    })
                    .collect(),
            }]),
        })
    }

    /// Channel types grouped under their parent channel, limited to what the
    /// selected bot (if any) can serve. Empty groups are left out.
    fn channel_options(&self, bot: Option<Option<BotType>>) -> Vec<OptionGroup> {
        ChannelGroup::ALL
            .iter()
            .map(|group| OptionGroup {
                label: Some(self.messages.text(&MessageKey::ChannelGroup(*group))),
                options: group
                    .channels()
                    .filter(|channel| bot.map(|b| channel.supports_bot(b)).unwrap_or(true))
                    .map(|channel| ValueOption {
                        value: channel.as_str().to_string(),
                        label: self.messages.text(&MessageKey::Channel(channel)),
                    })
                    .collect(),
            })
            .filter(|g| !g.options.is_empty())
            .collect()
    }
}

fn text_rules(entry: &CatalogEntry, digits_only: bool) -> TextRules {
    TextRules {
        required: true,
        max_length: entry.max_value_length(),
        digits_only,
    }
}

/// Validate a condition value.
///
/// Returns `Ok(None)` when the value is acceptable, `Ok(Some(_))` for a
/// user-facing field error, and `Err` when a stored channel value is not a
/// known channel type (catalog/data mismatch).
pub fn validate_value(
    entry: &CatalogEntry,
    operator: Operator,
    value: Option<&str>,
    consequent: &ConsequentDraft,
) -> Result<Option<FieldError>> {
    if operator.is_valueless() {
        return Ok(None);
    }
    let Some(condition_type) = entry.condition_type() else {
        return Err(Error::invariant(format!("'{}' is a group header", entry.key)));
    };

    let value = value.map(str::trim).unwrap_or("");
    if value.is_empty() {
        return Ok(Some(FieldError::Required));
    }

    match condition_type {
        ConditionType::Text | ConditionType::Number => {
            let max = entry.max_value_length();
            if value.chars().count() > max {
                return Ok(Some(FieldError::TooLong { max }));
            }
            if condition_type == ConditionType::Number && !is_digits(value) {
                return Ok(Some(FieldError::DigitsOnly));
            }
            Ok(None)
        }
        ConditionType::Dropdown if entry.is_channel_type() => {
            let channel = ChannelType::parse(value).ok_or_else(|| {
                Error::invariant(format!("unrecognized channel type '{}'", value))
            })?;
            Ok(channel_error(channel, consequent.bot_constraint()))
        }
        ConditionType::Dropdown => {
            if entry.options.iter().any(|o| o == value) {
                Ok(None)
            } else {
                Ok(Some(FieldError::NotAnOption))
            }
        }
    }
}

fn channel_error(channel: ChannelType, bot: Option<Option<BotType>>) -> Option<FieldError> {
    let bot_type = bot?;
    if channel.supports_bot(bot_type) {
        return None;
    }
    Some(match bot_type {
        Some(BotType::Custom) => FieldError::UnsupportedByCustomBot,
        Some(BotType::Faq) => FieldError::UnsupportedByFaqBot,
        None => FieldError::UnsupportedByBot,
    })
}

fn is_digits(value: &str) -> bool {
    Regex::new(r"^[0-9]+$")
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::messages::EnglishMessages;
    use crate::domain::{BotAgent, CustomField, CustomFieldType};
    use crate::services::catalog::{CHANNEL_TYPE_KEY, CUSTOMER_ID_KEY};

    fn catalog() -> KeyCatalog {
        KeyCatalog::build(
            &[
                CustomField::new("plan", "Plan", CustomFieldType::Dropdown)
                    .with_options(["free", "pro"]),
                CustomField::new("seats", "Seats", CustomFieldType::Integer),
                CustomField::new("notes", "Notes", CustomFieldType::String),
            ],
            &[],
            &EnglishMessages,
        )
    }

    fn bot(bot_type: Option<BotType>) -> ConsequentDraft {
        ConsequentDraft::GroupWithBotAgent {
            group: Some(1),
            agent: Some(BotAgent {
                id: 5,
                bot_type,
                group_ids: vec![1],
            }),
        }
    }

    fn group() -> ConsequentDraft {
        ConsequentDraft::Group { group: Some(1) }
    }

    #[test]
    fn test_valueless_operator_hides_value() {
        let catalog = catalog();
        let resolver = ValueResolver::new(&catalog, &EnglishMessages);
        for op in [Operator::IsEmpty, Operator::HasAnyValue, Operator::IsUnknown] {
            let control = resolver
                .resolve_control("ticket.customFields.notes", op, &group())
                .unwrap();
            assert_eq!(control, ValueControl::Hidden);
            let entry = catalog.get("ticket.customFields.notes").unwrap();
            assert_eq!(validate_value(entry, op, None, &group()).unwrap(), None);
        }
    }

    #[test]
    fn test_text_and_number_rules() {
        let catalog = catalog();
        let resolver = ValueResolver::new(&catalog, &EnglishMessages);
        assert_eq!(
            resolver.resolve_control(CUSTOMER_ID_KEY, Operator::Is, &group()).unwrap(),
            ValueControl::Text(TextRules {
                required: true,
                max_length: 100,
                digits_only: false
            })
        );
        assert_eq!(
            resolver
                .resolve_control("ticket.customFields.seats", Operator::GreaterThan, &group())
                .unwrap(),
            ValueControl::Number(TextRules {
                required: true,
                max_length: 190,
                digits_only: true
            })
        );
    }

    #[test]
    fn test_required_and_length() {
        let catalog = catalog();
        let entry = catalog.get(CUSTOMER_ID_KEY).unwrap();
        assert_eq!(
            validate_value(entry, Operator::Is, Some("   "), &group()).unwrap(),
            Some(FieldError::Required)
        );
        let long = "x".repeat(101);
        assert_eq!(
            validate_value(entry, Operator::Is, Some(&long), &group()).unwrap(),
            Some(FieldError::TooLong { max: 100 })
        );
    }

    #[test]
    fn test_number_requires_digits() {
        let catalog = catalog();
        let entry = catalog.get("ticket.customFields.seats").unwrap();
        assert_eq!(
            validate_value(entry, Operator::Is, Some("12a"), &group()).unwrap(),
            Some(FieldError::DigitsOnly)
        );
        assert_eq!(validate_value(entry, Operator::Is, Some("120"), &group()).unwrap(), None);
    }

    #[test]
    fn test_custom_dropdown_options() {
        let catalog = catalog();
        let resolver = ValueResolver::new(&catalog, &EnglishMessages);
        let control = resolver
            .resolve_control("ticket.customFields.plan", Operator::Is, &group())
            .unwrap();
        let ValueControl::Dropdown(groups) = control else {
            panic!("expected dropdown");
        };
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].options.len(), 2);

        let entry = catalog.get("ticket.customFields.plan").unwrap();
        assert_eq!(
            validate_value(entry, Operator::Is, Some("gold"), &group()).unwrap(),
            Some(FieldError::NotAnOption)
        );
    }

    #[test]
    fn test_channel_options_grouped_by_parent() {
        let catalog = catalog();
        let resolver = ValueResolver::new(&catalog, &EnglishMessages);
        let ValueControl::Dropdown(groups) = resolver
            .resolve_control(CHANNEL_TYPE_KEY, Operator::Is, &group())
            .unwrap()
        else {
            panic!("expected dropdown");
        };
        assert_eq!(groups.len(), ChannelGroup::ALL.len());
        let facebook = groups
            .iter()
            .find(|g| g.label.as_deref() == Some("Facebook"))
            .unwrap();
        let values: Vec<&str> = facebook.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["FACEBOOK_CONVERSATION", "FACEBOOK_FEED"]);
    }

    #[test]
    fn test_faq_bot_shrinks_channel_options_to_in_app() {
        let catalog = catalog();
        let resolver = ValueResolver::new(&catalog, &EnglishMessages);
        let ValueControl::Dropdown(groups) = resolver
            .resolve_control(CHANNEL_TYPE_KEY, Operator::Is, &bot(Some(BotType::Faq)))
            .unwrap()
        else {
            panic!("expected dropdown");
        };
        assert_eq!(groups.len(), 1);
        assert!(groups[0]
            .options
            .iter()
            .all(|o| ChannelType::parse(&o.value).unwrap().group() == ChannelGroup::InApp));
    }

    #[test]
    fn test_channel_errors_name_the_bot_subtype() {
        let catalog = catalog();
        let entry = catalog.get(CHANNEL_TYPE_KEY).unwrap();
        let feed = Some("FACEBOOK_FEED");
        assert_eq!(
            validate_value(entry, Operator::Is, feed, &bot(Some(BotType::Custom))).unwrap(),
            Some(FieldError::UnsupportedByCustomBot)
        );
        assert_eq!(
            validate_value(entry, Operator::Is, feed, &bot(Some(BotType::Faq))).unwrap(),
            Some(FieldError::UnsupportedByFaqBot)
        );
        assert_eq!(
            validate_value(entry, Operator::Is, feed, &bot(None)).unwrap(),
            Some(FieldError::UnsupportedByBot)
        );
        assert_eq!(validate_value(entry, Operator::Is, feed, &group()).unwrap(), None);
    }

    #[test]
    fn test_unknown_channel_is_an_invariant_violation() {
        let catalog = catalog();
        let entry = catalog.get(CHANNEL_TYPE_KEY).unwrap();
        let result = validate_value(entry, Operator::Is, Some("CARRIER_PIGEON"), &group());
        assert!(matches!(result, Err(Error::Invariant(_))));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let catalog = catalog();
        let resolver = ValueResolver::new(&catalog, &EnglishMessages);
        assert!(resolver
            .resolve_control("ticket.customFields.gone", Operator::Is, &group())
            .is_err());
    }
}
