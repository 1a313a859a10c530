//! Agent lookup relay: reads a workflow back from the platform and derives
//! its invocation URL from the webhook trigger node.

use mixer_core::models::{webhook_url, AgentSummary, PlatformWorkflow};
use mixer_core::template::WEBHOOK_NODE_TYPE;
use mixer_core::{MixerError, WorkflowPlatform};

/// Summarise a fetched workflow. A workflow without a webhook trigger is
/// valid and yields empty `webhook_id` / `webhook_url`.
pub fn summarize(workflow: PlatformWorkflow, base_url: &str) -> AgentSummary {
    let webhook_id = workflow
        .nodes
        .iter()
        .find(|n| n.kind == WEBHOOK_NODE_TYPE)
        .and_then(|n| n.webhook_id.clone())
        .unwrap_or_default();

    let url = if webhook_id.is_empty() {
        String::new()
    } else {
        webhook_url(base_url, &webhook_id)
    };

    AgentSummary {
        workflow_id: workflow.id,
        agent_name: workflow.name,
        webhook_id,
        webhook_url: url,
        active: workflow.active,
        created_at: workflow.created_at,
        updated_at: workflow.updated_at,
    }
}

pub async fn lookup_agent(platform: &dyn WorkflowPlatform, workflow_id: &str) -> Result<AgentSummary, MixerError> {
    if workflow_id.is_empty() {
        return Err(MixerError::validation("workflowId query param is required"));
    }

    let raw = platform.fetch_workflow(workflow_id).await?;
    let workflow: PlatformWorkflow =
        serde_json::from_value(raw).map_err(|e| MixerError::MalformedResponse(e.to_string()))?;

    let summary = summarize(workflow, platform.base_url());
    tracing::debug!(
        workflow_id = %summary.workflow_id,
        active = summary.active,
        has_webhook = !summary.webhook_id.is_empty(),
        "Looked up agent workflow"
    );
    Ok(summary)
}
