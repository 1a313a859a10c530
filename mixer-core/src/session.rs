//! Client session: the two-view state machine over a `StateStore`.
//!
//! The view is derived, never stored: `Dashboard` whenever a deployed agent
//! record is present, `Form` otherwise.

use serde_json::Value;

use crate::error::MixerError;
use crate::models::{AgentRecord, ChatMessage};
use crate::store::StateStore;

/// Agent message appended when the relay cannot be reached.
pub const RELAY_FAILURE_MESSAGE: &str = "Failed to reach the agent. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Form,
    Dashboard,
}

impl View {
    pub fn for_agent(agent: Option<&AgentRecord>) -> Self {
        match agent {
            Some(a) if a.is_deployed() => View::Dashboard,
            _ => View::Form,
        }
    }
}

pub struct Session<S: StateStore> {
    store: S,
    agent: Option<AgentRecord>,
    transcript: Vec<ChatMessage>,
}

impl<S: StateStore> Session<S> {
    /// Hydrate from the store. A stored record without an invocation target
    /// is treated as absent.
    pub fn open(store: S) -> Self {
        let agent = store.load().filter(AgentRecord::is_deployed);
        let transcript = store.load_chat();
        Self {
            store,
            agent,
            transcript,
        }
    }

    pub fn view(&self) -> View {
        View::for_agent(self.agent.as_ref())
    }

    pub fn agent(&self) -> Option<&AgentRecord> {
        self.agent.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn record_deployment(&mut self, agent: AgentRecord) -> Result<(), MixerError> {
        self.store.save(&agent)?;
        self.agent = Some(agent);
        Ok(())
    }

    /// Append the user's prompt (trimmed). Empty prompts are rejected.
    pub fn push_user(&mut self, prompt: &str) -> Result<&ChatMessage, MixerError> {
        let content = prompt.trim();
        if content.is_empty() {
            return Err(MixerError::validation("prompt is required"));
        }
        self.append(ChatMessage::user(content))
    }

    /// Append the agent's reply extracted from a relay response body.
    pub fn push_reply(&mut self, response: &Value) -> Result<&ChatMessage, MixerError> {
        self.append(ChatMessage::agent(reply_text(response)))
    }

    pub fn push_failure(&mut self) -> Result<&ChatMessage, MixerError> {
        self.append(ChatMessage::agent(RELAY_FAILURE_MESSAGE))
    }

    pub fn reset(&mut self) -> Result<(), MixerError> {
        self.store.clear()?;
        self.agent = None;
        self.transcript.clear();
        Ok(())
    }

    fn append(&mut self, message: ChatMessage) -> Result<&ChatMessage, MixerError> {
        self.transcript.push(message);
        self.store.save_chat(&self.transcript)?;
        Ok(&self.transcript[self.transcript.len() - 1])
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// First non-empty of `output`, `data.output`, `error`; otherwise the
/// compact JSON text of the whole body.
pub fn reply_text(response: &Value) -> String {
    non_empty_str(response.get("output"))
        .or_else(|| non_empty_str(response.get("data").and_then(|d| d.get("output"))))
        .or_else(|| non_empty_str(response.get("error")))
        .map(str::to_string)
        .unwrap_or_else(|| response.to_string())
}
