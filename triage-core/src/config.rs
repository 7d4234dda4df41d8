//! Configuration management
//!
//! Settings live in `<triage dir>/settings.json`:
//! ```json
//! {
//!   "app": { "demoMode": false, "pageSize": 50, ... },
//!   "api": { "baseUrl": "https://desk.example.com/api/v1", "token": "...", "timeoutSecs": 30 }
//! }
//! ```
//! Keys this crate does not manage are kept as-is on save.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::adapters::http::DEFAULT_TIMEOUT_SECS;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;

pub const DEMO_MODE_ENV: &str = "TRIAGE_DEMO_MODE";
pub const API_URL_ENV: &str = "TRIAGE_API_URL";
pub const API_TOKEN_ENV: &str = "TRIAGE_API_TOKEN";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    api: ApiSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_size: Option<usize>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Rule API connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Triage configuration (simplified view of settings)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub demo_mode: bool,
    pub api: ApiConfig,
    page_size: usize,
}

impl Config {
    /// Load config from the triage directory
    ///
    /// A missing or malformed file yields defaults. `TRIAGE_DEMO_MODE`,
    /// `TRIAGE_API_URL` and `TRIAGE_API_TOKEN` override the file.
    pub fn load(triage_dir: &Path) -> Result<Self> {
        let raw = read_settings(triage_dir)?;

        let demo_mode = match std::env::var(DEMO_MODE_ENV).ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.app.demo_mode,
        };

        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Ok(Self {
            demo_mode,
            api: ApiConfig {
                base_url: env(API_URL_ENV).or(raw.api.base_url),
                token: env(API_TOKEN_ENV).or(raw.api.token),
                timeout_secs: raw.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
            page_size: clamp_page_size(raw.app.page_size.unwrap_or(DEFAULT_PAGE_SIZE)),
        })
    }

    /// Save config to the triage directory
    ///
    /// Preserves other settings that the CLI doesn't manage
    pub fn save(&self, triage_dir: &Path) -> Result<()> {
        let settings_path = triage_dir.join("settings.json");
        let mut settings = read_settings(triage_dir)?;

        settings.app.demo_mode = self.demo_mode;
        settings.app.page_size = Some(self.page_size());
        settings.api.base_url = self.api.base_url.clone();
        settings.api.token = self.api.token.clone();
        settings.api.timeout_secs = Some(self.api.timeout_secs);

        std::fs::create_dir_all(triage_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Rules and custom fields fetched per request
    pub fn page_size(&self) -> usize {
        clamp_page_size(self.page_size)
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = clamp_page_size(page_size);
    }

    /// Enable demo mode
    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    /// Disable demo mode
    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }
}

fn read_settings(triage_dir: &Path) -> Result<SettingsFile> {
    let settings_path = triage_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

fn clamp_page_size(page_size: usize) -> usize {
    page_size.clamp(1, MAX_PAGE_SIZE)
}
