//! Shared types for the AgentForce relay: error taxonomy, caller
//! credentials, configuration and structured trace events.

pub mod config;
pub mod credentials;
pub mod error;
pub mod trace;

pub use credentials::Credentials;
pub use error::{Error, ErrorKind, Result};
