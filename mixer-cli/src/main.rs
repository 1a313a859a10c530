//! mixer-cli: zyndmixer client
//!
//! Deploys a single agent workflow through `mixer-server`, keeps the agent
//! record and chat transcript in a local state directory, and chats with the
//! deployed agent through the server's relay.
//!
//! # Subcommands
//! - `deploy --name <n> --description <d> [--social-url <u>]`: deploy and remember the agent
//! - `chat <prompt>`         : send a prompt to the deployed agent
//! - `status`                : server health and local agent
//! - `history`               : print the chat transcript
//! - `lookup [workflow-id]`  : current platform state of a workflow
//! - `reset`                 : forget the agent and transcript

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use mixer_core::{AgentRecord, AgentSummary, ChatMessage, ChatRole, FileStore, Session, StateStore, View};
use serde::Serialize;
use serde_json::Value;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8787";
const DEFAULT_STATE_DIR: &str = "~/.zyndmixer";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "mixer-cli",
    version,
    about = "zyndmixer: deploy a paid AI agent workflow and chat with it"
)]
struct Cli {
    /// zyndmixer server URL (overrides ZYNDMIXER_URL env var)
    #[arg(long, env = "ZYNDMIXER_URL", default_value = DEFAULT_SERVER)]
    server: String,

    /// Directory holding the local agent record and chat history
    #[arg(long, env = "ZYNDMIXER_STATE_DIR", default_value = DEFAULT_STATE_DIR)]
    state_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Deploy a new agent workflow
    Deploy {
        /// Display name of the agent
        #[arg(long)]
        name: String,

        /// What the agent should do
        #[arg(long)]
        description: String,

        /// Optional social profile link woven into the system prompt
        #[arg(long)]
        social_url: Option<String>,
    },

    /// Send a prompt to the deployed agent
    Chat {
        /// Prompt text
        prompt: String,
    },

    /// Show server health and the locally deployed agent
    Status,

    /// Print the chat transcript
    History,

    /// Look up a workflow on the platform (defaults to the deployed agent)
    Lookup {
        workflow_id: Option<String>,
    },

    /// Forget the deployed agent and clear the chat transcript
    Reset,
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeployBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    social_url: Option<&'a str>,
    description: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody<'a> {
    webhook_url: &'a str,
    prompt: &'a str,
}

/// Render a server `{error, details?}` body as one line.
pub fn error_message(body: &Value) -> String {
    let error = body["error"].as_str().unwrap_or("request failed");
    match body["details"].as_str().filter(|d| !d.is_empty()) {
        Some(details) => format!("{}: {}", error, details),
        None => error.to_string(),
    }
}

/// One transcript line: `[HH:MM:SS] you> hello`.
pub fn format_message(message: &ChatMessage) -> String {
    let who = match message.role {
        ChatRole::User => "you",
        ChatRole::Agent => "agent",
    };
    format!(
        "[{}] {}> {}",
        message.timestamp.format("%H:%M:%S"),
        who,
        message.content
    )
}

/// Append the agent side of a chat exchange. `None` means the relay could
/// not be reached or answered with something other than JSON.
pub fn record_chat_outcome<S: StateStore>(
    session: &mut Session<S>,
    outcome: Option<Value>,
) -> anyhow::Result<ChatMessage> {
    let message = match outcome {
        Some(body) => session.push_reply(&body)?,
        None => session.push_failure()?,
    };
    Ok(message.clone())
}

fn open_session(state_dir: &str) -> Session<FileStore> {
    let dir = shellexpand::tilde(state_dir).into_owned();
    Session::open(FileStore::new(dir))
}

fn http_client(timeout: Option<Duration>) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder().timeout(timeout).build()?)
}

// ============================================================================
// Commands
// ============================================================================

fn do_deploy(
    server: &str,
    session: &mut Session<FileStore>,
    name: &str,
    description: &str,
    social_url: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(agent) = session.agent() {
        bail!(
            "agent {} is already deployed; run `mixer-cli reset` first",
            agent.agent_name
        );
    }

    let client = http_client(Some(Duration::from_secs(60)))?;
    let url = format!("{}/api/deploy", server);
    let body = DeployBody {
        name,
        social_url: social_url.filter(|s| !s.trim().is_empty()),
        description,
    };

    let resp = client
        .post(&url)
        .json(&body)
        .send()
        .with_context(|| format!("connection failed to {}", url))?;

    let status = resp.status();
    let json: Value = resp.json().unwrap_or_default();
    if !status.is_success() {
        bail!("deploy failed ({}): {}", status, error_message(&json));
    }

    let agent: AgentRecord =
        serde_json::from_value(json).context("failed to parse deploy response")?;
    tracing::debug!(workflow_id = %agent.workflow_id, "Deployed agent");

    println!("Deployed:    {}", agent.agent_name);
    println!("Workflow ID: {}", agent.workflow_id);
    println!("Webhook URL: {}", agent.webhook_url);
    session.record_deployment(agent)?;
    Ok(())
}

fn do_chat(server: &str, session: &mut Session<FileStore>, prompt: &str) -> anyhow::Result<()> {
    let webhook_url = match session.agent() {
        Some(agent) => agent.webhook_url.clone(),
        None => bail!("no agent deployed; run `mixer-cli deploy` first"),
    };

    let prompt = session.push_user(prompt)?.content.clone();

    // Agent runs can be slow; no client timeout on the relay call.
    let client = http_client(None)?;
    let url = format!("{}/api/chat", server);
    let outcome = match client
        .post(&url)
        .json(&ChatBody {
            webhook_url: &webhook_url,
            prompt: &prompt,
        })
        .send()
    {
        Ok(resp) => {
            if !resp.status().is_success() {
                tracing::warn!(status = resp.status().as_u16(), "Relay returned an error");
            }
            resp.json::<Value>().ok()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Relay unreachable");
            None
        }
    };

    let reply = record_chat_outcome(session, outcome)?;
    println!("{}", reply.content);
    Ok(())
}

fn do_status(server: &str, session: &Session<FileStore>) -> anyhow::Result<()> {
    let client = http_client(Some(Duration::from_secs(10)))?;
    let url = format!("{}/health", server);

    match client.get(&url).send() {
        Ok(r) if r.status().is_success() => {
            let body: Value = r.json().unwrap_or_default();
            println!("Server:      {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:     {}", body["version"].as_str().unwrap_or("?"));
            println!("Platform:    {}", body["platform"].as_str().unwrap_or("?"));
        }
        Ok(r) => println!("Server:      unhealthy (HTTP {})", r.status()),
        Err(e) => println!("Server:      unreachable ({})", e),
    }

    match (session.view(), session.agent()) {
        (View::Dashboard, Some(agent)) => {
            println!("Agent:       {}", agent.agent_name);
            println!("Workflow ID: {}", agent.workflow_id);
            println!("Webhook URL: {}", agent.webhook_url);
            println!("Deployed at: {}", agent.created_at.to_rfc3339());
            println!("Messages:    {}", session.transcript().len());
        }
        _ => println!("Agent:       none deployed"),
    }
    Ok(())
}

fn do_history(session: &Session<FileStore>) {
    if session.transcript().is_empty() {
        eprintln!("No messages yet");
        return;
    }
    for message in session.transcript() {
        println!("{}", format_message(message));
    }
}

fn do_lookup(
    server: &str,
    session: &Session<FileStore>,
    workflow_id: Option<String>,
) -> anyhow::Result<()> {
    let workflow_id = workflow_id
        .or_else(|| session.agent().map(|a| a.workflow_id.clone()))
        .ok_or_else(|| anyhow!("no workflow id given and no agent deployed"))?;

    let client = http_client(Some(Duration::from_secs(30)))?;
    let url = format!("{}/api/agent", server);
    let resp = client
        .get(&url)
        .query(&[("workflowId", workflow_id.as_str())])
        .send()
        .with_context(|| format!("connection failed to {}", url))?;

    let status = resp.status();
    let json: Value = resp.json().unwrap_or_default();
    if !status.is_success() {
        bail!("lookup failed ({}): {}", status, error_message(&json));
    }

    let summary: AgentSummary =
        serde_json::from_value(json).context("failed to parse lookup response")?;
    println!("Workflow ID: {}", summary.workflow_id);
    println!("Name:        {}", summary.agent_name);
    println!("Active:      {}", summary.active);
    if summary.webhook_url.is_empty() {
        println!("Webhook URL: (no webhook trigger)");
    } else {
        println!("Webhook URL: {}", summary.webhook_url);
    }
    if let Some(updated) = summary.updated_at {
        println!("Updated at:  {}", updated.to_rfc3339());
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();
    let mut session = open_session(&cli.state_dir);

    let result = match cli.command {
        Commands::Deploy {
            name,
            description,
            social_url,
        } => do_deploy(&server, &mut session, &name, &description, social_url.as_deref()),
        Commands::Chat { prompt } => do_chat(&server, &mut session, &prompt),
        Commands::Status => do_status(&server, &session),
        Commands::History => {
            do_history(&session);
            Ok(())
        }
        Commands::Lookup { workflow_id } => do_lookup(&server, &session, workflow_id),
        Commands::Reset => session
            .reset()
            .map(|_| println!("Agent and chat history cleared"))
            .map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("mixer-cli: {:#}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
