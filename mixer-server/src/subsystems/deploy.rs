//! Deployment orchestrator
//!
//! Creates the agent workflow on the platform, patches its description and
//! activates it. The webhook id is generated here, before the workflow
//! exists, and is the only input to the returned invocation URL.
//!
//! The three platform calls run strictly in order. Only the description
//! patch may fail without failing the deployment. Nothing is rolled back:
//! a workflow created before an activation failure stays on the platform.

use chrono::{DateTime, Utc};
use mixer_core::config::TemplateConfig;
use mixer_core::models::workflow::workflow_id_of;
use mixer_core::models::{webhook_url, AgentRecord};
use mixer_core::template::{build_agent_workflow, AgentProfile};
use mixer_core::{MixerError, WorkflowPlatform};
use serde_json::Value;
use uuid::Uuid;

/// Fields the platform rejects on `PATCH /rest/workflows/{id}`.
const READ_ONLY_FIELDS: [&str; 5] = ["id", "createdAt", "updatedAt", "shared", "activeVersion"];

/// Build the update body: the created workflow with `description` replaced
/// and the read-only fields removed.
pub fn update_payload(created: &Value, description: &str) -> Value {
    let mut payload = created.clone();
    if let Some(obj) = payload.as_object_mut() {
        obj.insert("description".to_string(), Value::String(description.to_string()));
        for field in READ_ONLY_FIELDS {
            obj.remove(field);
        }
    }
    payload
}

fn created_at_of(created: &Value) -> DateTime<Utc> {
    created
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

/// Deploy a new agent workflow. Not idempotent: every call creates a new
/// workflow with a new webhook id.
pub async fn deploy_agent(
    platform: &dyn WorkflowPlatform,
    template: &TemplateConfig,
    name: &str,
    social_url: Option<&str>,
    description: &str,
) -> Result<AgentRecord, MixerError> {
    if name.trim().is_empty() || description.trim().is_empty() {
        return Err(MixerError::validation("Name and description are required"));
    }
    let social_url = social_url.filter(|s| !s.is_empty());

    let webhook_id = Uuid::new_v4().to_string();
    let profile = AgentProfile {
        name,
        social_url,
        description,
    };
    let definition = build_agent_workflow(template, &profile, &webhook_id);

    let created = match platform.create_workflow(&definition).await {
        Ok(created) => created,
        Err(e) => {
            tracing::error!(agent = %definition.name, error = %e, "Workflow creation failed");
            return Err(e);
        }
    };

    let workflow_id = created
        .get("id")
        .and_then(workflow_id_of)
        .ok_or_else(|| MixerError::MalformedResponse("created workflow has no id".to_string()))?;

    tracing::info!(
        workflow_id = %workflow_id,
        agent = %definition.name,
        webhook_id = %webhook_id,
        "Created agent workflow"
    );

    let patch = update_payload(&created, description);
    if let Err(e) = platform.update_workflow(&workflow_id, &patch).await {
        tracing::warn!(
            workflow_id = %workflow_id,
            error = %e,
            "Description update failed, continuing with activation"
        );
    }

    if let Err(e) = platform.activate_workflow(&workflow_id).await {
        tracing::error!(workflow_id = %workflow_id, error = %e, "Workflow activation failed");
        return Err(e);
    }

    tracing::info!(workflow_id = %workflow_id, "Agent workflow active");

    Ok(AgentRecord {
        workflow_id,
        agent_name: definition.name,
        webhook_url: webhook_url(platform.base_url(), &webhook_id),
        webhook_id,
        created_at: created_at_of(&created),
        active: true,
        user_name: name.to_string(),
        social_url: social_url.unwrap_or_default().to_string(),
        description: description.to_string(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
