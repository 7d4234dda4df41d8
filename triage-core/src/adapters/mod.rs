//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest client for the rule, custom field and agent APIs
//! - JSON-file workspace that stands in for the server (demo mode, tests)
//! - Demo seed data for the workspace
//! - English message catalog
//! - In-memory and tracing notifiers

pub mod demo;
pub mod http;
pub mod messages;
pub mod notifier;
pub mod workspace;
