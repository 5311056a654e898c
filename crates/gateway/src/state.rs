use std::sync::Arc;

use af_domain::config::Config;
use af_remote::AgentApi;
use af_sessions::SessionRegistry;

use crate::dispatch::Dispatcher;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<SessionRegistry>,
    pub dispatcher: Dispatcher,
    /// SHA-256 of the shared API key. `None` means auth is disabled (dev mode).
    pub api_key_hash: Option<Vec<u8>>,
}

impl AppState {
    /// Wire a registry and dispatcher around `api`.
    pub fn new(config: Arc<Config>, api: Arc<dyn AgentApi>, api_key_hash: Option<Vec<u8>>) -> Self {
        let registry = Arc::new(SessionRegistry::new(api));
        let dispatcher = Dispatcher::new(registry.clone());
        Self {
            config,
            registry,
            dispatcher,
            api_key_hash,
        }
    }
}
