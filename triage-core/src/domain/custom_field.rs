//! Custom field definitions fetched from the field directory

use serde::{Deserialize, Serialize};

use super::condition::ConditionType;

/// Primitive kind of a custom field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomFieldType {
    String,
    Integer,
    Dropdown,
    Link,
    #[serde(other)]
    Other,
}

impl CustomFieldType {
    /// Condition type for a field of this kind, `None` if the field cannot be filtered on
    pub fn condition_type(&self) -> Option<ConditionType> {
        match self {
            CustomFieldType::String => Some(ConditionType::Text),
            CustomFieldType::Integer => Some(ConditionType::Number),
            CustomFieldType::Link => None,
            CustomFieldType::Dropdown | CustomFieldType::Other => Some(ConditionType::Dropdown),
        }
    }
}

/// Which record a custom field is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldScope {
    Ticket,
    Customer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub key: String,
    pub name: String,
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub options: Vec<String>,
}

impl CustomField {
    pub fn new(key: impl Into<String>, name: impl Into<String>, field_type: CustomFieldType) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            field_type,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_mapping() {
        assert_eq!(CustomFieldType::String.condition_type(), Some(ConditionType::Text));
        assert_eq!(CustomFieldType::Integer.condition_type(), Some(ConditionType::Number));
        assert_eq!(CustomFieldType::Dropdown.condition_type(), Some(ConditionType::Dropdown));
        assert_eq!(CustomFieldType::Link.condition_type(), None);
    }

    #[test]
    fn test_unknown_kinds_become_dropdowns() {
        let field: CustomField = serde_json::from_str(
            r#"{"key":"tier","name":"Tier","fieldType":"MULTI_SELECT","options":["gold"]}"#,
        )
        .unwrap();
        assert_eq!(field.field_type, CustomFieldType::Other);
        assert_eq!(field.field_type.condition_type(), Some(ConditionType::Dropdown));
    }
}
