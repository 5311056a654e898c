//! HTTP gateway for the AgentForce relay: operation dispatcher, axum
//! routes, CLI and bootstrap.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod dispatch;
pub mod state;
