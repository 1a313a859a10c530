//! HTTP integration tests for the zyndmixer REST API
//!
//! The workflow platform and the agent webhooks are both stood in by a
//! wiremock server; requests go through the full Axum router via `oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use mixer_core::{MixerConfig, N8nClient, PlatformCredentials};
use mixer_server::http::{build_router, HttpState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_http_state(mock_server: &MockServer) -> Arc<HttpState> {
    let config = MixerConfig::for_platform(mock_server.uri());
    let credentials = PlatformCredentials {
        api_key: "n8n-test-key".to_string(),
        gateway_key: "gateway-test-key".to_string(),
    };
    let platform = N8nClient::new(&config.platform, credentials).unwrap();
    Arc::new(HttpState::new(config, Arc::new(platform)))
}

async fn send(state: Arc<HttpState>, req: Request<Body>) -> (StatusCode, Value) {
    let resp = build_router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// ===========================================================================
// TEST 1: GET /version: returns version and protocol
// ===========================================================================
#[tokio::test]
async fn test_version_endpoint_integration() {
    let mock_server = MockServer::start().await;
    let (status, json) = send(make_http_state(&mock_server), get("/version")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["version"].is_string());
    assert_eq!(json["protocol"], "zyndmixer/1");
}

// ===========================================================================
// TEST 2: GET /health: healthy with platform base URL
// ===========================================================================
#[tokio::test]
async fn test_health_endpoint_integration() {
    let mock_server = MockServer::start().await;
    let (status, json) = send(make_http_state(&mock_server), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["platform"], mock_server.uri());
}

// ===========================================================================
// TEST 3: POST /api/deploy: create, patch, activate, then record response
// ===========================================================================
#[tokio::test]
async fn test_deploy_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .and(header("X-N8N-API-KEY", "n8n-test-key"))
        .and(header("X-API-KEY", "gateway-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "name": "zyndmixer-ada-lovelace",
            "createdAt": "2026-02-18T10:00:00.000Z"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/workflows/42"))
        .and(header("cookie", "n8n-auth=n8n-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows/42/activate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "active": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, json) = send(
        make_http_state(&mock_server),
        post_json(
            "/api/deploy",
            json!({
                "name": "Ada Lovelace",
                "socialUrl": "https://x.com/ada",
                "description": "Answers questions about analytical engines"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", json);
    assert_eq!(json["success"], true);
    assert_eq!(json["workflowId"], "42");
    assert_eq!(json["agentName"], "zyndmixer-ada-lovelace");
    assert_eq!(json["userName"], "Ada Lovelace");
    assert_eq!(json["active"], true);
    assert_eq!(json["createdAt"], "2026-02-18T10:00:00Z");

    let webhook_id = json["webhookId"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(webhook_id).is_ok());
    assert_eq!(
        json["webhookUrl"],
        format!("{}/webhook/{}/pay", mock_server.uri(), webhook_id)
    );
}

// ===========================================================================
// TEST 4: POST /api/deploy: missing name is 400 and makes no platform call
// ===========================================================================
#[tokio::test]
async fn test_deploy_validation_integration() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, json) = send(
        make_http_state(&mock_server),
        post_json("/api/deploy", json!({ "description": "no name" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({ "error": "Name and description are required" }));
}

// ===========================================================================
// TEST 5: POST /api/deploy: activation failure status is relayed
// ===========================================================================
#[tokio::test]
async fn test_deploy_activation_failure_integration() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "wf-9" })))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows/wf-9/activate"))
        .respond_with(ResponseTemplate::new(400).set_body_string("credential missing"))
        .mount(&mock_server)
        .await;

    let (status, json) = send(
        make_http_state(&mock_server),
        post_json("/api/deploy", json!({ "name": "Ada", "description": "math" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Failed to activate workflow");
    assert_eq!(json["details"], "credential missing");
}

// ===========================================================================
// TEST 6: POST /api/chat: relays prompt, returns agent JSON unchanged
// ===========================================================================
#[tokio::test]
async fn test_chat_relay_integration() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/abc/pay"))
        .and(body_json(json!({ "prompt": "hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": "hi" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let webhook_url = format!("{}/webhook/abc/pay", mock_server.uri());
    let (status, json) = send(
        make_http_state(&mock_server),
        post_json(
            "/api/chat",
            json!({ "webhookUrl": webhook_url, "prompt": "hello" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "output": "hi" }));
}

// ===========================================================================
// TEST 7: POST /api/chat: missing prompt is 400
// ===========================================================================
#[tokio::test]
async fn test_chat_validation_integration() {
    let mock_server = MockServer::start().await;
    let (status, json) = send(
        make_http_state(&mock_server),
        post_json("/api/chat", json!({ "webhookUrl": "http://x/webhook/a/pay" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "webhookUrl and prompt are required");
}

// ===========================================================================
// TEST 8: GET /api/agent: summary derived from the fetched workflow
// ===========================================================================
#[tokio::test]
async fn test_agent_lookup_integration() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/wf-1"))
        .and(header("X-N8N-API-KEY", "n8n-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wf-1",
            "name": "zyndmixer-ada",
            "active": true,
            "createdAt": "2026-02-18T10:00:00.000Z",
            "updatedAt": "2026-02-18T10:05:00.000Z",
            "nodes": [
                { "name": "X402 Webhook", "type": "CUSTOM.zyndX402Webhook", "webhookId": "hook-1" }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, json) = send(
        make_http_state(&mock_server),
        get("/api/agent?workflowId=wf-1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", json);
    assert_eq!(json["workflowId"], "wf-1");
    assert_eq!(json["agentName"], "zyndmixer-ada");
    assert_eq!(json["webhookId"], "hook-1");
    assert_eq!(
        json["webhookUrl"],
        format!("{}/webhook/hook-1/pay", mock_server.uri())
    );
    assert_eq!(json["active"], true);
}

// ===========================================================================
// TEST 9: GET /api/agent: missing query param is 400, 404 is relayed
// ===========================================================================
#[tokio::test]
async fn test_agent_lookup_errors_integration() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    let state = make_http_state(&mock_server);

    let (status, json) = send(state.clone(), get("/api/agent")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "workflowId query param is required");

    let (status, json) = send(state, get("/api/agent?workflowId=missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Failed to fetch workflow");
    assert_eq!(json["details"], "not found");
}
