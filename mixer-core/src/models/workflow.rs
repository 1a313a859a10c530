use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Workflow definition submitted to the platform on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    pub description: String,
    pub settings: WorkflowSettings,
    pub nodes: Vec<WorkflowNode>,
    pub connections: BTreeMap<String, NodeConnections>,
}

#[cfg(test)]
impl WorkflowDefinition {
    pub fn node(&self, name: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn node_of_kind(&self, kind: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.kind == kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSettings {
    pub save_execution_progress: bool,
    pub save_manual_executions: bool,
    pub save_data_error_execution: String,
    pub save_data_success_execution: String,
    /// Seconds
    pub execution_timeout: u64,
    pub execution_order: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    pub parameters: serde_json::Value,
    #[serde(rename = "type")]
    pub kind: String,
    pub type_version: f64,
    pub position: [i32; 2],
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<BTreeMap<String, CredentialRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRef {
    pub id: String,
    pub name: String,
}

/// Outgoing edges of one node, keyed by connection kind
/// (`main`, `ai_languageModel`, `ai_tool`). Each kind holds one list of
/// targets per output slot.
pub type NodeConnections = BTreeMap<String, Vec<Vec<ConnectionTarget>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub node: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub index: u32,
}

/// Workflow as read back from the platform. Only the fields the lookup
/// relay needs; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformWorkflow {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<PlatformNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformNode {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default)]
    pub webhook_id: Option<String>,
}

/// Treat an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Platform ids are strings, but numeric ids are accepted and normalised.
pub fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    workflow_id_of(&value).ok_or_else(|| serde::de::Error::custom("workflow id must be a string or number"))
}

/// Extract an id value (string or number) as a string.
pub fn workflow_id_of(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
