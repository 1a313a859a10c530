pub mod config;
pub mod error;
pub mod models;
pub mod platform;
pub mod session;
pub mod store;
pub mod template;

pub use config::MixerConfig;
pub use error::MixerError;
pub use models::{AgentRecord, AgentSummary, ChatMessage, ChatRole};
pub use platform::{N8nClient, PlatformCredentials, WorkflowPlatform};
pub use session::{Session, View};
pub use store::{FileStore, MemoryStore, StateStore};
