//! Condition key catalog - the keys a condition can filter on
//!
//! Fixed system keys come first, each source's custom fields follow its
//! group header:
//!
//! ```text
//! Ticket            (header)
//!   Channel type
//!   <ticket custom fields>
//! Customer          (header)
//!   Customer ID
//!   Customer name
//!   <customer custom fields>
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::result::{Error, Result, StoreResult};
use crate::domain::{ConditionType, CustomField, FieldScope, Operation, Page};
use crate::ports::{CustomFieldDirectory, MessageCatalog, MessageKey, SystemKey};

pub const TICKET_GROUP_KEY: &str = "$ticket";
pub const CHANNEL_TYPE_KEY: &str = "channelType";
pub const CUSTOMER_GROUP_KEY: &str = "$customer";
pub const CUSTOMER_ID_KEY: &str = "customerId";
pub const CUSTOMER_NAME_KEY: &str = "customerName";

/// Max value length for identity-like keys (customer id / name)
pub const IDENTITY_MAX_LENGTH: usize = 100;
/// Max value length for every other free-text key
pub const DEFAULT_MAX_LENGTH: usize = 190;

/// Condition key for a ticket custom field
pub fn ticket_field_key(field_key: &str) -> String {
    format!("ticket.customFields.{}", field_key)
}

/// Condition key for a customer custom field
pub fn customer_field_key(field_key: &str) -> String {
    format!("customer.customFields.{}", field_key)
}

/// Where a catalog entry comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    System(SystemKey),
    CustomField(FieldScope),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Display-only group header, never selectable
    Header,
    Key(ConditionType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: String,
    pub name: String,
    pub kind: EntryKind,
    pub source: KeySource,
    /// Stored options of a dropdown custom field
    pub options: Vec<String>,
}

impl CatalogEntry {
    pub fn is_selectable(&self) -> bool {
        matches!(self.kind, EntryKind::Key(_))
    }

    pub fn condition_type(&self) -> Option<ConditionType> {
        match self.kind {
            EntryKind::Key(ty) => Some(ty),
            EntryKind::Header => None,
        }
    }

    pub fn is_channel_type(&self) -> bool {
        self.source == KeySource::System(SystemKey::ChannelType)
    }

    pub fn max_value_length(&self) -> usize {
        match self.source {
            KeySource::System(SystemKey::CustomerId | SystemKey::CustomerName) => {
                IDENTITY_MAX_LENGTH
            }
            _ => DEFAULT_MAX_LENGTH,
        }
    }
}

/// Ordered map from condition key to its catalog entry
#[derive(Debug, Clone, Default)]
pub struct KeyCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl KeyCatalog {
    /// Build the catalog from the two custom field sources.
    ///
    /// `LINK` fields cannot be filtered on and are left out.
    pub fn build(
        ticket_fields: &[CustomField],
        customer_fields: &[CustomField],
        messages: &dyn MessageCatalog,
    ) -> Self {
        let mut catalog = Self::default();

        catalog.push_system(TICKET_GROUP_KEY, SystemKey::TicketGroup, None, messages);
        catalog.push_system(
            CHANNEL_TYPE_KEY,
            SystemKey::ChannelType,
            Some(ConditionType::Dropdown),
            messages,
        );
        catalog.push_fields(FieldScope::Ticket, ticket_fields);

        catalog.push_system(CUSTOMER_GROUP_KEY, SystemKey::CustomerGroup, None, messages);
        catalog.push_system(
            CUSTOMER_ID_KEY,
            SystemKey::CustomerId,
            Some(ConditionType::Text),
            messages,
        );
        catalog.push_system(
            CUSTOMER_NAME_KEY,
            SystemKey::CustomerName,
            Some(ConditionType::Text),
            messages,
        );
        catalog.push_fields(FieldScope::Customer, customer_fields);

        catalog
    }

    fn push_system(
        &mut self,
        key: &str,
        system_key: SystemKey,
        condition_type: Option<ConditionType>,
        messages: &dyn MessageCatalog,
    ) {
        self.push(CatalogEntry {
            key: key.to_string(),
            name: messages.text(&MessageKey::SystemKey(system_key)),
            kind: condition_type.map(EntryKind::Key).unwrap_or(EntryKind::Header),
            source: KeySource::System(system_key),
            options: Vec::new(),
        });
    }

    fn push_fields(&mut self, scope: FieldScope, fields: &[CustomField]) {
        for field in fields {
            let Some(condition_type) = field.field_type.condition_type() else {
                continue;
            };
            let key = match scope {
                FieldScope::Ticket => ticket_field_key(&field.key),
                FieldScope::Customer => customer_field_key(&field.key),
            };
            self.push(CatalogEntry {
                key,
                name: field.name.clone(),
                kind: EntryKind::Key(condition_type),
                source: KeySource::CustomField(scope),
                options: field.options.clone(),
            });
        }
    }

    fn push(&mut self, entry: CatalogEntry) {
        if self.index.contains_key(&entry.key) {
            warn!(key = %entry.key, "duplicate condition key in catalog, keeping the first");
            return;
        }
        self.index.insert(entry.key.clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// All entries, headers included, in display order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn selectable_entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.is_selectable())
    }

    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Entry for a key that can be used in a condition
    pub fn selectable(&self, key: &str) -> Option<&CatalogEntry> {
        self.get(key).filter(|e| e.is_selectable())
    }

    pub fn condition_type(&self, key: &str) -> Option<ConditionType> {
        self.get(key).and_then(|e| e.condition_type())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads custom fields and builds the catalog
pub struct CatalogService {
    fields: Arc<dyn CustomFieldDirectory>,
    page_size: usize,
}

impl CatalogService {
    pub fn new(fields: Arc<dyn CustomFieldDirectory>, page_size: usize) -> Self {
        Self {
            fields,
            page_size: page_size.max(1),
        }
    }

    /// Fetch every ticket and customer custom field and build the catalog
    pub async fn load(&self, messages: &dyn MessageCatalog) -> Result<KeyCatalog> {
        let ticket_fields = self.fetch_all(FieldScope::Ticket).await?;
        let customer_fields = self.fetch_all(FieldScope::Customer).await?;
        debug!(
            ticket = ticket_fields.len(),
            customer = customer_fields.len(),
            "loaded custom fields"
        );
        Ok(KeyCatalog::build(&ticket_fields, &customer_fields, messages))
    }

    async fn fetch_all(&self, scope: FieldScope) -> Result<Vec<CustomField>> {
        let mut fields = Vec::new();
        loop {
            let page = self
                .fetch_page(scope, fields.len())
                .await
                .map_err(|e| Error::store(Operation::FetchCustomFields, e))?;
            let received = page.results.len();
            fields.extend(page.results);
            if received == 0 || fields.len() >= page.count {
                break;
            }
        }
        Ok(fields)
    }

    async fn fetch_page(&self, scope: FieldScope, offset: usize) -> StoreResult<Page<CustomField>> {
        match scope {
            FieldScope::Ticket => self.fields.list_ticket_fields(offset, self.page_size).await,
            FieldScope::Customer => self.fields.list_customer_fields(offset, self.page_size).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::messages::EnglishMessages;
    use crate::domain::CustomFieldType;

    fn ticket_fields() -> Vec<CustomField> {
        vec![
            CustomField::new("plan", "Plan", CustomFieldType::Dropdown)
                .with_options(["free", "pro", "enterprise"]),
            CustomField::new("orderCount", "Order count", CustomFieldType::Integer),
            CustomField::new("invoice", "Invoice link", CustomFieldType::Link),
        ]
    }

    fn customer_fields() -> Vec<CustomField> {
        vec![CustomField::new("company", "Company", CustomFieldType::String)]
    }

    #[test]
    fn test_catalog_order() {
        let catalog = KeyCatalog::build(&ticket_fields(), &customer_fields(), &EnglishMessages);
        let keys: Vec<&str> = catalog.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                TICKET_GROUP_KEY,
                CHANNEL_TYPE_KEY,
                "ticket.customFields.plan",
                "ticket.customFields.orderCount",
                CUSTOMER_GROUP_KEY,
                CUSTOMER_ID_KEY,
                CUSTOMER_NAME_KEY,
                "customer.customFields.company",
            ]
        );
    }

    #[test]
    fn test_link_fields_are_excluded() {
        let catalog = KeyCatalog::build(&ticket_fields(), &[], &EnglishMessages);
        assert!(catalog.get("ticket.customFields.invoice").is_none());
    }

    #[test]
    fn test_headers_are_not_selectable() {
        let catalog = KeyCatalog::build(&[], &[], &EnglishMessages);
        assert!(catalog.get(TICKET_GROUP_KEY).is_some());
        assert!(catalog.selectable(TICKET_GROUP_KEY).is_none());
        assert!(catalog.selectable(CHANNEL_TYPE_KEY).is_some());
        assert_eq!(catalog.selectable_entries().count(), 3);
    }

    #[test]
    fn test_types_and_lengths() {
        let catalog = KeyCatalog::build(&ticket_fields(), &customer_fields(), &EnglishMessages);
        assert_eq!(
            catalog.condition_type("ticket.customFields.orderCount"),
            Some(ConditionType::Number)
        );
        assert_eq!(
            catalog.condition_type("customer.customFields.company"),
            Some(ConditionType::Text)
        );
        assert_eq!(catalog.condition_type(CHANNEL_TYPE_KEY), Some(ConditionType::Dropdown));
        assert_eq!(catalog.get(CUSTOMER_ID_KEY).unwrap().max_value_length(), 100);
        assert_eq!(
            catalog.get("customer.customFields.company").unwrap().max_value_length(),
            190
        );
        assert_eq!(catalog.get(CUSTOMER_NAME_KEY).unwrap().name, "Customer name");
    }

    #[test]
    fn test_same_field_key_in_both_scopes() {
        let shared = vec![CustomField::new("region", "Region", CustomFieldType::String)];
        let catalog = KeyCatalog::build(&shared, &shared, &EnglishMessages);
        assert!(catalog.get("ticket.customFields.region").is_some());
        assert!(catalog.get("customer.customFields.region").is_some());
    }
}
