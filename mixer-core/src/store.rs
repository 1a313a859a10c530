//! Client state store
//!
//! Holds the single deployed agent and the chat transcript on the client.
//! Synchronous, single writer, last write wins. Unreadable state loads as
//! empty so a corrupt file never blocks the client from starting over.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::MixerError;
use crate::models::{AgentRecord, ChatMessage};

pub const AGENT_KEY: &str = "zyndmixer-agent-data";
pub const CHAT_KEY: &str = "zyndmixer-chat-history";

pub trait StateStore {
    fn load(&self) -> Option<AgentRecord>;
    fn save(&self, agent: &AgentRecord) -> Result<(), MixerError>;
    fn load_chat(&self) -> Vec<ChatMessage>;
    fn save_chat(&self, messages: &[ChatMessage]) -> Result<(), MixerError>;
    fn clear(&self) -> Result<(), MixerError>;
}

/// JSON files under a state directory, one per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read client state");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable client state");
                None
            }
        }
    }

    fn write<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), MixerError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(self.path(key), json)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MixerError> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Option<AgentRecord> {
        self.read(AGENT_KEY)
    }

    fn save(&self, agent: &AgentRecord) -> Result<(), MixerError> {
        self.write(AGENT_KEY, agent)
    }

    fn load_chat(&self) -> Vec<ChatMessage> {
        self.read(CHAT_KEY).unwrap_or_default()
    }

    fn save_chat(&self, messages: &[ChatMessage]) -> Result<(), MixerError> {
        self.write(CHAT_KEY, messages)
    }

    fn clear(&self) -> Result<(), MixerError> {
        self.remove(AGENT_KEY)?;
        self.remove(CHAT_KEY)
    }
}

/// In-process store, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    agent: Mutex<Option<AgentRecord>>,
    chat: Mutex<Vec<ChatMessage>>,
}

impl StateStore for MemoryStore {
    fn load(&self) -> Option<AgentRecord> {
        self.agent.lock().ok().and_then(|a| a.clone())
    }

    fn save(&self, agent: &AgentRecord) -> Result<(), MixerError> {
        if let Ok(mut slot) = self.agent.lock() {
            *slot = Some(agent.clone());
        }
        Ok(())
    }

    fn load_chat(&self) -> Vec<ChatMessage> {
        self.chat.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn save_chat(&self, messages: &[ChatMessage]) -> Result<(), MixerError> {
        if let Ok(mut slot) = self.chat.lock() {
            *slot = messages.to_vec();
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), MixerError> {
        if let Ok(mut slot) = self.agent.lock() {
            *slot = None;
        }
        if let Ok(mut slot) = self.chat.lock() {
            slot.clear();
        }
        Ok(())
    }
}
