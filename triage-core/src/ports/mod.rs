//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external collaborators. The rule engine
//! depends only on these traits, not on the HTTP client or view layer.

mod directory;
mod messages;
mod notifier;
mod rule_store;

pub use directory::{AgentDirectory, CustomFieldDirectory};
pub use messages::{MessageCatalog, MessageKey, SystemKey};
pub use notifier::Notifier;
pub use rule_store::RuleStore;
