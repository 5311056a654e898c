//! Client for the remote conversational-agent API.
//!
//! [`AgentApi`] is the seam sessions program against; [`RemoteAgentClient`]
//! is the HTTP implementation used in production.

pub mod client;
pub mod traits;
pub(crate) mod util;
pub mod wire;

// Re-exports for convenience.
pub use client::{RemoteAgentClient, CORRELATION_HEADER};
pub use traits::{
    AgentApi, AgentReply, CreateSessionRequest, RemoteSession, SendMessageRequest, TokenGrant,
};
pub use wire::NO_RESPONSE_TEXT;
