pub mod agent;
pub mod chat;
pub mod workflow;

pub use agent::{webhook_url, AgentRecord, AgentSummary};
pub use chat::{ChatMessage, ChatRole};
pub use workflow::{
    ConnectionTarget, CredentialRef, NodeConnections, PlatformNode, PlatformWorkflow,
    WorkflowDefinition, WorkflowNode, WorkflowSettings,
};
