//! Rule API client
//!
//! Talks to the help desk's JSON REST API for rules, custom fields and
//! agents. Every response is mapped onto `StoreError` here so services
//! never see transport details.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::domain::result::{StoreError, StoreResult};
use crate::domain::{
    Agent, AgentGroup, AgentId, CustomField, GroupId, NewRule, Page, Rule, RuleError, RuleId,
    RuleOrder, RuleType, RuleUpdate,
};
use crate::ports::{AgentDirectory, CustomFieldDirectory, RuleStore};

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error body returned with 400/422 responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<RuleError>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP implementation of the rule store and directories
#[derive(Debug, Clone)]
pub struct HttpRuleApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
    timeout_secs: u64,
}

impl HttpRuleApi {
    /// Create a client for `base_url` (http or https)
    pub fn new(base_url: &str, token: Option<&str>, timeout_secs: u64) -> Result<Self> {
        let mut parsed = Url::parse(base_url.trim()).context("Invalid API URL")?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("API URL must use http or https");
        }
        if parsed.cannot_be_a_base() {
            anyhow::bail!("API URL cannot be used as a base URL");
        }
        // Url::join replaces the last segment unless the path ends in '/'
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        let timeout_secs = timeout_secs.max(1);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: parsed,
            token: token.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string),
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> StoreResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::Connect(format!("invalid endpoint {}: {}", path, e)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;
        check_response_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Page<T>> {
        let url = self.endpoint(path)?;
        debug!(%url, ?query, "fetching page");
        self.send_json(self.client.get(url).query(query)).await
    }

    /// Map request errors to store errors
    fn map_request_error(&self, error: reqwest::Error) -> StoreError {
        if error.is_timeout() {
            StoreError::Timeout
        } else if error.is_connect() {
            StoreError::Connect(format!("unable to reach {}", self.base_url))
        } else if error.is_decode() {
            StoreError::Decode(error.to_string())
        } else {
            warn!(error = %error, timeout_secs = self.timeout_secs, "rule API request failed");
            StoreError::Connect(error.to_string())
        }
    }
}

/// Check the response status, turning failures into store errors
async fn check_response_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(map_status(status, &body))
}

fn map_status(status: StatusCode, body: &str) -> StoreError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|b| b.detail.clone().or_else(|| b.message.clone()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            match parsed.and_then(|b| b.error).filter(|e| !e.is_empty()) {
                Some(payload) => StoreError::Validation(payload),
                None => StoreError::Http {
                    status: status.as_u16(),
                    message,
                },
            }
        }
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::CONFLICT => StoreError::Conflict(message),
        _ => StoreError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl RuleStore for HttpRuleApi {
    async fn list(&self, rule_type: RuleType, offset: usize, limit: usize) -> StoreResult<Page<Rule>> {
        self.page(
            "rules",
            &[
                ("type", rule_type.as_str().to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn get(&self, id: RuleId) -> StoreResult<Rule> {
        let url = self.endpoint(&format!("rules/{}", id))?;
        self.send_json(self.client.get(url)).await
    }

    async fn create(&self, rule: &NewRule) -> StoreResult<Rule> {
        let url = self.endpoint("rules")?;
        self.send_json(self.client.post(url).json(rule)).await
    }

    async fn update(&self, update: &RuleUpdate) -> StoreResult<Rule> {
        let url = self.endpoint(&format!("rules/{}", update.id))?;
        self.send_json(self.client.patch(url).json(update)).await
    }

    async fn delete(&self, id: RuleId) -> StoreResult<()> {
        let url = self.endpoint(&format!("rules/{}", id))?;
        self.send(self.client.delete(url)).await.map(|_| ())
    }

    async fn reorder(&self, rule_type: RuleType, orders: &[RuleOrder]) -> StoreResult<()> {
        let url = self.endpoint("rules/order")?;
        self.send(
            self.client
                .patch(url)
                .query(&[("type", rule_type.as_str())])
                .json(orders),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl CustomFieldDirectory for HttpRuleApi {
    async fn list_ticket_fields(&self, offset: usize, limit: usize) -> StoreResult<Page<CustomField>> {
        self.page(
            "ticket_fields",
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn list_customer_fields(
        &self,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Page<CustomField>> {
        self.page(
            "customer_fields",
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}

#[async_trait]
impl AgentDirectory for HttpRuleApi {
    async fn get_agent_group(&self, id: GroupId) -> StoreResult<AgentGroup> {
        let url = self.endpoint(&format!("groups/{}", id))?;
        self.send_json(self.client.get(url)).await
    }

    async fn get_agent(&self, id: AgentId) -> StoreResult<Agent> {
        let url = self.endpoint(&format!("agents/{}", id))?;
        self.send_json(self.client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConditionErrorType;

    #[test]
    fn test_rejects_non_http_scheme() {
        assert!(HttpRuleApi::new("ftp://desk.example.com/api", None, 30).is_err());
        assert!(HttpRuleApi::new("not a url", None, 30).is_err());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let api = HttpRuleApi::new("https://desk.example.com/api/v2", Some("t"), 30).unwrap();
        assert_eq!(api.base_url().as_str(), "https://desk.example.com/api/v2/");
        assert_eq!(
            api.endpoint("rules/7").unwrap().as_str(),
            "https://desk.example.com/api/v2/rules/7"
        );
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let api = HttpRuleApi::new("https://desk.example.com/", Some("  "), 30).unwrap();
        assert!(api.token.is_none());
    }

    #[test]
    fn test_validation_payload_maps_to_validation() {
        let body = r#"{"error": {"conditions": [{"index": 1, "errorType": "VALUE", "reason": "Unknown option"}]}}"#;
        match map_status(StatusCode::BAD_REQUEST, body) {
            StoreError::Validation(payload) => {
                assert_eq!(payload.conditions[0].index, 1);
                assert_eq!(payload.conditions[0].error_type, ConditionErrorType::Value);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_request_without_payload_is_http() {
        let err = map_status(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail": "Bad rule"}"#);
        assert_eq!(
            err,
            StoreError::Http {
                status: 422,
                message: "Bad rule".to_string()
            }
        );
    }

    #[test]
    fn test_other_statuses() {
        assert!(matches!(map_status(StatusCode::NOT_FOUND, ""), StoreError::NotFound(_)));
        assert!(matches!(map_status(StatusCode::CONFLICT, ""), StoreError::Conflict(_)));
        assert_eq!(
            map_status(StatusCode::BAD_GATEWAY, "<html>"),
            StoreError::Http {
                status: 502,
                message: "Bad Gateway".to_string()
            }
        );
    }
}
