//! Triage Core - ticket routing rule engine
//!
//! This crate implements the rule editing logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Rule, Condition, Consequent, RuleError, ...)
//! - **ports**: Trait definitions for external collaborators (RuleStore, directories, Notifier)
//! - **services**: Catalog, form controller, error reconciliation, ordering, orchestration
//! - **adapters**: Concrete implementations (HTTP API, local workspace, English messages)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::demo::demo_workspace;
use adapters::http::HttpRuleApi;
use adapters::messages::EnglishMessages;
use adapters::workspace::LocalWorkspace;
use config::Config;
use ports::{AgentDirectory, CustomFieldDirectory, MessageCatalog, Notifier, RuleStore};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{Condition, Conditional, Consequent, Rule, RuleError, RuleStatus, RuleType};

/// Workspace file used in demo mode
pub const DEMO_WORKSPACE_FILE: &str = "demo.json";

/// Main context for Triage operations
///
/// Holds the configuration, the backend selected by it, and all services.
pub struct TriageContext {
    pub config: Config,
    pub triage_dir: PathBuf,
    pub messages: Arc<dyn MessageCatalog>,
    pub rule_service: RuleService,
    pub catalog_service: CatalogService,
    pub logging_service: Arc<LoggingService>,
}

impl TriageContext {
    /// Create a new Triage context
    ///
    /// Demo mode uses a seeded local workspace; otherwise the rule API
    /// configured in settings.json (or the environment) is used.
    pub fn new(triage_dir: &Path, notifier: Arc<dyn Notifier>, entry_point: EntryPoint) -> Result<Self> {
        std::fs::create_dir_all(triage_dir)
            .with_context(|| format!("Failed to create {}", triage_dir.display()))?;
        let config = Config::load(triage_dir)?;

        let (store, fields, agents) = if config.demo_mode {
            let workspace = Arc::new(LocalWorkspace::open_or_seed(
                &triage_dir.join(DEMO_WORKSPACE_FILE),
                demo_workspace,
            )?);
            backends(workspace)
        } else {
            let base_url = config.api.base_url.as_deref().ok_or_else(|| {
                Error::Config(
                    "No rule API configured. Set api.baseUrl in settings.json, \
                     TRIAGE_API_URL, or run 'triage demo on'."
                        .to_string(),
                )
            })?;
            let api = Arc::new(HttpRuleApi::new(
                base_url,
                config.api.token.as_deref(),
                config.api.timeout_secs,
            )?);
            backends(api)
        };

        let messages: Arc<dyn MessageCatalog> = Arc::new(EnglishMessages);
        let logging_service = Arc::new(LoggingService::new(
            triage_dir,
            entry_point,
            env!("CARGO_PKG_VERSION"),
        )?);

        let rule_service = RuleService::new(
            store,
            agents,
            notifier,
            Arc::clone(&messages),
            config.page_size(),
        )
        .with_logger(Arc::clone(&logging_service));
        let catalog_service = CatalogService::new(fields, config.page_size());

        Ok(Self {
            config,
            triage_dir: triage_dir.to_path_buf(),
            messages,
            rule_service,
            catalog_service,
            logging_service,
        })
    }

    /// Load the condition key catalog with this context's messages
    pub async fn load_catalog(&self) -> domain::result::Result<Arc<KeyCatalog>> {
        Ok(Arc::new(self.catalog_service.load(self.messages.as_ref()).await?))
    }
}

type Backends = (
    Arc<dyn RuleStore>,
    Arc<dyn CustomFieldDirectory>,
    Arc<dyn AgentDirectory>,
);

fn backends<B>(backend: Arc<B>) -> Backends
where
    B: RuleStore + CustomFieldDirectory + AgentDirectory + 'static,
{
    (backend.clone(), backend.clone(), backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::notifier::RecordingNotifier;
    use tempfile::TempDir;

    #[test]
    fn test_requires_api_url_outside_demo_mode() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("settings.json"), r#"{"app": {"demoMode": false}}"#).unwrap();
        if std::env::var(config::API_URL_ENV).is_ok() || std::env::var(config::DEMO_MODE_ENV).is_ok() {
            return;
        }
        let result = TriageContext::new(dir.path(), Arc::new(RecordingNotifier::new()), EntryPoint::Cli);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_demo_mode_seeds_workspace() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("settings.json"), r#"{"app": {"demoMode": true}}"#).unwrap();
        if std::env::var(config::DEMO_MODE_ENV).is_ok() {
            return;
        }
        let ctx = TriageContext::new(dir.path(), Arc::new(RecordingNotifier::new()), EntryPoint::Cli)
            .unwrap();
        assert!(dir.path().join(DEMO_WORKSPACE_FILE).exists());

        let rules = ctx.rule_service.list_rules(RuleType::Assignment).await.unwrap();
        assert_eq!(rules.len(), 4);
        let catalog = ctx.load_catalog().await.unwrap();
        assert!(catalog.selectable("channelType").is_some());
    }
}
