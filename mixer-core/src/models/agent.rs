use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single deployed agent, as held by the client.
///
/// `webhook_id` is chosen before the remote workflow exists and
/// `webhook_url` is derived from it, so neither changes after deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub workflow_id: String,
    pub agent_name: String,
    pub webhook_id: String,
    pub webhook_url: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub social_url: String,
    #[serde(default)]
    pub description: String,
}

impl AgentRecord {
    /// A record is usable only once it carries an invocation target.
    pub fn is_deployed(&self) -> bool {
        !self.webhook_id.is_empty() && !self.webhook_url.is_empty()
    }
}

/// Current state of a workflow as reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub workflow_id: String,
    pub agent_name: String,
    pub webhook_id: String,
    pub webhook_url: String,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// `<base>/webhook/<webhook_id>/pay`
pub fn webhook_url(base_url: &str, webhook_id: &str) -> String {
    format!("{}/webhook/{}/pay", base_url.trim_end_matches('/'), webhook_id)
}
