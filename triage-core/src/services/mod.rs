//! Service layer - rule editing and orchestration
//!
//! The editing components (catalog, value resolver, consequent resolver,
//! form controller, error reconciler, ordering) are synchronous and pure.
//! `RuleService` drives them against the ports.

pub mod catalog;
pub mod consequent;
pub mod logging;
pub mod ordering;
pub mod rule_form;
mod rule_service;
pub mod server_errors;
pub mod value_resolver;

pub use catalog::{CatalogEntry, CatalogService, EntryKind, KeyCatalog, KeySource};
pub use consequent::{transition, ConsequentDraft, ConsequentErrors};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use ordering::{reorder, RuleList};
pub use rule_form::{
    ConditionErrors, ConditionSlot, ConditionView, ConsequentView, FormMode, FormValidation,
    FormView, RuleForm, RulePayload,
};
pub use rule_service::{RuleEditor, RuleService};
pub use server_errors::{remove_condition_errors, ReconciledErrors};
pub use value_resolver::{validate_value, OptionGroup, TextRules, ValueControl, ValueOption, ValueResolver};
