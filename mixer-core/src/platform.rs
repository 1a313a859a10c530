//! Workflow platform client
//!
//! `WorkflowPlatform` abstracts the four REST calls the agent relays make
//! against n8n. `N8nClient` is the reqwest implementation.
//!
//! Nothing here retries: every upstream failure is reported once with its
//! status and raw body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use crate::config::{PlatformConfig, GATEWAY_API_KEY_ENV, PLATFORM_API_KEY_ENV};
use crate::error::MixerError;
use crate::models::WorkflowDefinition;

/// Abstraction over the workflow automation platform.
#[async_trait]
pub trait WorkflowPlatform: Send + Sync {
    /// `POST /api/v1/workflows`. Returns the created object as sent back by
    /// the platform (including its assigned `id`).
    async fn create_workflow(&self, definition: &WorkflowDefinition) -> Result<Value, MixerError>;

    /// `PATCH /rest/workflows/{id}` with a full workflow body.
    async fn update_workflow(&self, workflow_id: &str, body: &Value) -> Result<(), MixerError>;

    /// `POST /api/v1/workflows/{id}/activate`.
    async fn activate_workflow(&self, workflow_id: &str) -> Result<(), MixerError>;

    /// `GET /api/v1/workflows/{id}?excludePinnedData=true`.
    async fn fetch_workflow(&self, workflow_id: &str) -> Result<Value, MixerError>;

    /// Base URL that webhook URLs are composed against.
    fn base_url(&self) -> &str;
}

/// Platform credentials. Sourced from the environment, never from config.
#[derive(Debug, Clone)]
pub struct PlatformCredentials {
    pub api_key: String,
    pub gateway_key: String,
}

impl PlatformCredentials {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(PLATFORM_API_KEY_ENV).unwrap_or_default(),
            gateway_key: std::env::var(GATEWAY_API_KEY_ENV).unwrap_or_default(),
        }
    }
}

/// n8n REST client.
#[derive(Debug, Clone)]
pub struct N8nClient {
    client: Client,
    credentials: PlatformCredentials,
    base_url: String,
}

impl N8nClient {
    pub fn new(config: &PlatformConfig, credentials: PlatformCredentials) -> Result<Self, MixerError> {
        if credentials.api_key.is_empty() {
            return Err(MixerError::MissingApiKey(PLATFORM_API_KEY_ENV));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

type UpstreamError = fn(u16, String) -> MixerError;

/// Pass a success response through; otherwise read the body and wrap it with
/// the status in the given upstream error.
async fn ensure_success(response: Response, upstream: UpstreamError) -> Result<Response, MixerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), body = %body, "Workflow platform returned an error");
    Err(upstream(status.as_u16(), body))
}

async fn json_body(response: Response) -> Result<Value, MixerError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| MixerError::MalformedResponse(e.to_string()))
}

#[async_trait]
impl WorkflowPlatform for N8nClient {
    async fn create_workflow(&self, definition: &WorkflowDefinition) -> Result<Value, MixerError> {
        let response = self
            .client
            .post(self.url("/api/v1/workflows"))
            .header("accept", "*/*")
            .header("X-API-KEY", &self.credentials.gateway_key)
            .header("X-N8N-API-KEY", &self.credentials.api_key)
            .json(definition)
            .send()
            .await?;

        let response = ensure_success(response, |status, body| MixerError::UpstreamCreate { status, body }).await?;
        json_body(response).await
    }

    async fn update_workflow(&self, workflow_id: &str, body: &Value) -> Result<(), MixerError> {
        let response = self
            .client
            .patch(self.url(&format!("/rest/workflows/{}", workflow_id)))
            .header("accept", "application/json")
            .header("cookie", format!("n8n-auth={}", self.credentials.api_key))
            .header("X-N8N-API-KEY", &self.credentials.api_key)
            .json(body)
            .send()
            .await?;

        ensure_success(response, |status, body| MixerError::UpstreamUpdate { status, body }).await?;
        Ok(())
    }

    async fn activate_workflow(&self, workflow_id: &str) -> Result<(), MixerError> {
        let response = self
            .client
            .post(self.url(&format!("/api/v1/workflows/{}/activate", workflow_id)))
            .header("accept", "application/json")
            .header("X-N8N-API-KEY", &self.credentials.api_key)
            .send()
            .await?;

        ensure_success(response, |status, body| MixerError::UpstreamActivate { status, body }).await?;
        Ok(())
    }

    async fn fetch_workflow(&self, workflow_id: &str) -> Result<Value, MixerError> {
        let response = self
            .client
            .get(self.url(&format!("/api/v1/workflows/{}", workflow_id)))
            .query(&[("excludePinnedData", "true")])
            .header("accept", "application/json")
            .header("X-N8N-API-KEY", &self.credentials.api_key)
            .send()
            .await?;

        let response = ensure_success(response, |status, body| MixerError::UpstreamFetch { status, body }).await?;
        json_body(response).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateConfig;
    use crate::template::{build_agent_workflow, AgentProfile};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_credentials() -> PlatformCredentials {
        PlatformCredentials {
            api_key: "n8n-test-key".to_string(),
            gateway_key: "gateway-test-key".to_string(),
        }
    }

    fn test_client(mock_server: &MockServer) -> N8nClient {
        let config = PlatformConfig {
            base_url: format!("{}/", mock_server.uri()),
            request_timeout_seconds: Some(5),
        };
        N8nClient::new(&config, test_credentials()).expect("Failed to create client")
    }

    fn test_definition() -> WorkflowDefinition {
        let profile = AgentProfile {
            name: "Ada",
            social_url: None,
            description: "math agent",
        };
        build_agent_workflow(&TemplateConfig::default(), &profile, "hook-1")
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let config = PlatformConfig {
            base_url: "http://localhost:5678".to_string(),
            request_timeout_seconds: None,
        };
        let credentials = PlatformCredentials {
            api_key: String::new(),
            gateway_key: "g".to_string(),
        };
        match N8nClient::new(&config, credentials) {
            Err(MixerError::MissingApiKey(var)) => assert_eq!(var, PLATFORM_API_KEY_ENV),
            other => panic!("Expected MissingApiKey, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_base_url_trailing_slash_is_trimmed() {
        let mock_server = MockServer::start().await;
        let client = test_client(&mock_server);
        assert_eq!(client.base_url(), mock_server.uri());
    }

    #[tokio::test]
    async fn test_create_workflow_sends_both_keys_and_definition() {
        let mock_server = MockServer::start().await;
        let client = test_client(&mock_server);
        let definition = test_definition();

        Mock::given(method("POST"))
            .and(path("/api/v1/workflows"))
            .and(header("content-type", "application/json"))
            .and(header("X-API-KEY", "gateway-test-key"))
            .and(header("X-N8N-API-KEY", "n8n-test-key"))
            .and(body_json(serde_json::to_value(&definition).unwrap()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "wf-1",
                "name": "zyndmixer-ada",
                "createdAt": "2026-02-18T10:00:00.000Z"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let created = client.create_workflow(&definition).await.unwrap();
        assert_eq!(created["id"], "wf-1");
    }

    #[tokio::test]
    async fn test_create_workflow_error_keeps_status_and_body() {
        let mock_server = MockServer::start().await;
        let client = test_client(&mock_server);

        Mock::given(method("POST"))
            .and(path("/api/v1/workflows"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&mock_server)
            .await;

        match client.create_workflow(&test_definition()).await {
            Err(MixerError::UpstreamCreate { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("Expected UpstreamCreate, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_workflow_non_json_success_is_malformed() {
        let mock_server = MockServer::start().await;
        let client = test_client(&mock_server);

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&mock_server)
            .await;

        let result = client.create_workflow(&test_definition()).await;
        assert!(matches!(result, Err(MixerError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_update_workflow_uses_internal_rest_path_and_cookie() {
        let mock_server = MockServer::start().await;
        let client = test_client(&mock_server);

        Mock::given(method("PATCH"))
            .and(path("/rest/workflows/wf-1"))
            .and(header("cookie", "n8n-auth=n8n-test-key"))
            .and(header("X-N8N-API-KEY", "n8n-test-key"))
            .and(body_json(json!({ "name": "a", "description": "d" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        client
            .update_workflow("wf-1", &json!({ "name": "a", "description": "d" }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_activate_workflow_maps_failure() {
        let mock_server = MockServer::start().await;
        let client = test_client(&mock_server);

        Mock::given(method("POST"))
            .and(path("/api/v1/workflows/wf-1/activate"))
            .and(header("X-N8N-API-KEY", "n8n-test-key"))
            .respond_with(ResponseTemplate::new(400).set_body_string("missing credentials"))
            .mount(&mock_server)
            .await;

        match client.activate_workflow("wf-1").await {
            Err(MixerError::UpstreamActivate { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "missing credentials");
            }
            other => panic!("Expected UpstreamActivate, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_workflow_excludes_pinned_data() {
        let mock_server = MockServer::start().await;
        let client = test_client(&mock_server);

        Mock::given(method("GET"))
            .and(path("/api/v1/workflows/wf-1"))
            .and(query_param("excludePinnedData", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "wf-1", "nodes": [] })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let wf = client.fetch_workflow("wf-1").await.unwrap();
        assert_eq!(wf["id"], "wf-1");
    }

    #[tokio::test]
    async fn test_fetch_workflow_not_found() {
        let mock_server = MockServer::start().await;
        let client = test_client(&mock_server);

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock_server)
            .await;

        let result = client.fetch_workflow("missing").await;
        assert!(matches!(result, Err(MixerError::UpstreamFetch { status: 404, .. })));
    }
}
