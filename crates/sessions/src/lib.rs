//! Per-caller session state for the AgentForce relay.
//!
//! A [`ClientSession`] owns one caller's token, remote agent session and
//! message sequence. The [`SessionRegistry`] maps caller ids to sessions and
//! creates them on first use.

pub mod registry;
pub mod session;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use registry::{RegistryStats, SessionRegistry};
pub use session::{token_preview, Authenticated, ClientSession, MessageOutcome, SessionStatus};
