//! Agent workflow template
//!
//! Builds the fixed seven-node workflow every deployed agent runs: an x402
//! webhook trigger feeds the AI agent, whose output is published and then
//! returned through the respond node. The chat model and the two Zynd tools
//! hang off the agent as auxiliary inputs.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use crate::config::{CredentialConfig, TemplateConfig};
use crate::models::{
    ConnectionTarget, CredentialRef, NodeConnections, WorkflowDefinition, WorkflowNode,
    WorkflowSettings,
};

pub const AGENT_NODE: &str = "AI Agent";
pub const CHAT_MODEL_NODE: &str = "OpenAI Chat Model";
pub const PUBLISHER_NODE: &str = "Zynd Agent Publisher";
pub const WEBHOOK_NODE: &str = "X402 Webhook";
pub const RESPOND_NODE: &str = "Respond to Webhook";
pub const SEARCH_TOOL_NODE: &str = "Zynd Agent Search";
pub const CALL_TOOL_NODE: &str = "HTTP Request (x402)";

/// Node type of the payment-gated webhook trigger that carries the webhook id.
pub const WEBHOOK_NODE_TYPE: &str = "CUSTOM.zyndX402Webhook";

pub const MAIN: &str = "main";
pub const AI_LANGUAGE_MODEL: &str = "ai_languageModel";
pub const AI_TOOL: &str = "ai_tool";

/// User-supplied fields that parameterise the template.
#[derive(Debug, Clone, Copy)]
pub struct AgentProfile<'a> {
    pub name: &'a str,
    pub social_url: Option<&'a str>,
    pub description: &'a str,
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Human-readable workflow name: `<prefix>-<name>` with whitespace runs
/// hyphenated and everything lowercased. Not unique.
pub fn agent_slug(prefix: &str, name: &str) -> String {
    let hyphenated = whitespace_run().replace_all(name, "-");
    format!("{}-{}", prefix, hyphenated.to_lowercase())
}

pub fn system_prompt(profile: &AgentProfile<'_>) -> String {
    let social = match profile.social_url {
        Some(url) if !url.is_empty() => format!(" Social: {}.", url),
        _ => String::new(),
    };
    format!(
        "You are {}.{}\n\n\
         Here is the exact description provided by the user:\n\"{}\"\n\n\
         For every user prompt, use the Zynd Search tool to find relevant agents, then pick the best one \
         and call it via the HTTP Request (x402) tool using its n8nHttpWebhookUrl.\n\n\
         Our agent name is: {{{{ $workflow.name }}}} so don't select an agent with this name.",
        profile.name, social, profile.description
    )
}

fn credentials(entries: &[(&str, &CredentialConfig)]) -> Option<BTreeMap<String, CredentialRef>> {
    Some(
        entries
            .iter()
            .map(|(key, c)| {
                (
                    key.to_string(),
                    CredentialRef {
                        id: c.id.clone(),
                        name: c.name.clone(),
                    },
                )
            })
            .collect(),
    )
}

fn node(
    name: &str,
    kind: &str,
    type_version: f64,
    position: [i32; 2],
    parameters: serde_json::Value,
) -> WorkflowNode {
    WorkflowNode {
        parameters,
        kind: kind.to_string(),
        type_version,
        position,
        name: name.to_string(),
        credentials: None,
        webhook_id: None,
    }
}

fn edge(connections: &mut BTreeMap<String, NodeConnections>, from: &str, kind: &str, to: &str) {
    connections
        .entry(from.to_string())
        .or_default()
        .entry(kind.to_string())
        .or_insert_with(|| vec![Vec::new()])[0]
        .push(ConnectionTarget {
            node: to.to_string(),
            kind: kind.to_string(),
            index: 0,
        });
}

/// Build the agent workflow with `webhook_id` embedded in the trigger node.
pub fn build_agent_workflow(
    config: &TemplateConfig,
    profile: &AgentProfile<'_>,
    webhook_id: &str,
) -> WorkflowDefinition {
    let agent = node(
        AGENT_NODE,
        "@n8n/n8n-nodes-langchain.agent",
        3.0,
        [0, 32],
        json!({
            "promptType": "define",
            "text": "={{ $json.body.prompt }}",
            "hasOutputParser": true,
            "options": { "systemMessage": system_prompt(profile) },
        }),
    );

    let mut chat_model = node(
        CHAT_MODEL_NODE,
        "@n8n/n8n-nodes-langchain.lmChatOpenAi",
        1.3,
        [-48, 320],
        json!({
            "model": { "__rl": true, "mode": "list", "value": config.model },
            "responsesApiEnabled": false,
            "options": {},
        }),
    );
    chat_model.credentials = credentials(&[("openAiApi", &config.openai_credential)]);

    let mut publisher = node(PUBLISHER_NODE, "CUSTOM.zyndAgentPublisher", 1.0, [352, 32], json!({}));
    publisher.credentials = credentials(&[("zyndAiApi", &config.zynd_credential)]);

    let mut webhook = node(
        WEBHOOK_NODE,
        WEBHOOK_NODE_TYPE,
        1.0,
        [-384, 48],
        json!({
            "responseMode": "responseNode",
            "serverWalletAddress": config.server_wallet_address,
            "price": config.price,
            "options": {},
        }),
    );
    webhook.webhook_id = Some(webhook_id.to_string());

    let respond = node(
        RESPOND_NODE,
        "CUSTOM.respondToWebhook",
        1.5,
        [576, 32],
        json!({
            "respondWith": "json",
            "responseBody": "={{ JSON.stringify({ output: $('AI Agent').item.json.output }) }}",
            "options": {},
        }),
    );

    let mut search_tool = node(
        SEARCH_TOOL_NODE,
        "CUSTOM.zyndAgentSearchTool",
        1.0,
        [192, 352],
        json!({
            "agentKeyword": "={{ $fromAI(\"keyword\", \"give a short description of what kind of agent you want to search\", \"string\") }}",
        }),
    );
    search_tool.credentials = credentials(&[
        ("zyndAiApi", &config.zynd_credential),
        ("web3wallet", &config.wallet_credential),
    ]);

    let mut call_tool = node(
        CALL_TOOL_NODE,
        "CUSTOM.zyndHttpRequestX402Tool",
        1.0,
        [336, 352],
        json!({
            "url": "={{ $fromAI(\"n8nHttpWebhookUrl\", \"This is the webhook url of the agent we want to call\", \"string\") }}",
            "method": "POST",
            "sendBody": true,
            "jsonBody": "={\"prompt\": \"{{ $fromAI(\"prompt\", \"Prompt message to ask that agent\", \"string\") }}\"}",
            "maxPaymentUsd": config.max_payment_usd,
        }),
    );
    call_tool.credentials = credentials(&[("web3wallet", &config.wallet_credential)]);

    let mut connections = BTreeMap::new();
    edge(&mut connections, WEBHOOK_NODE, MAIN, AGENT_NODE);
    edge(&mut connections, AGENT_NODE, MAIN, PUBLISHER_NODE);
    edge(&mut connections, PUBLISHER_NODE, MAIN, RESPOND_NODE);
    edge(&mut connections, CHAT_MODEL_NODE, AI_LANGUAGE_MODEL, AGENT_NODE);
    edge(&mut connections, SEARCH_TOOL_NODE, AI_TOOL, AGENT_NODE);
    edge(&mut connections, CALL_TOOL_NODE, AI_TOOL, AGENT_NODE);

    WorkflowDefinition {
        name: agent_slug(&config.agent_prefix, profile.name),
        description: profile.description.to_string(),
        settings: WorkflowSettings {
            save_execution_progress: true,
            save_manual_executions: true,
            save_data_error_execution: "all".to_string(),
            save_data_success_execution: "all".to_string(),
            execution_timeout: config.execution_timeout_seconds,
            execution_order: "v1".to_string(),
        },
        nodes: vec![agent, chat_model, publisher, webhook, respond, search_tool, call_tool],
        connections,
    }
}
