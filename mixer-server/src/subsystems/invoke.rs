//! Invocation relay: forwards a chat prompt to a deployed agent's webhook.
//!
//! The call may be a paid, slow agent run, so no timeout or retry is applied
//! here; the caller owns both.

use mixer_core::MixerError;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct PromptEnvelope<'a> {
    prompt: &'a str,
}

/// POST `{"prompt": prompt}` to `webhook_url` and return the response JSON
/// unchanged. The prompt is forwarded exactly as given, whitespace included.
pub async fn invoke_agent(client: &Client, webhook_url: &str, prompt: &str) -> Result<Value, MixerError> {
    if webhook_url.is_empty() || prompt.is_empty() {
        return Err(MixerError::validation("webhookUrl and prompt are required"));
    }

    let response = client
        .post(webhook_url)
        .header("accept", "*/*")
        .json(&PromptEnvelope { prompt })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Agent webhook returned an error");
        return Err(MixerError::UpstreamInvocation {
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| MixerError::MalformedResponse(e.to_string()))
}
