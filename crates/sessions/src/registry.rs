//! Process-wide map from caller id to [`ClientSession`].
//!
//! Sessions live in memory only and never expire on their own; they go away
//! through `remove`, `clear_all`, or process exit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use af_domain::trace::TraceEvent;
use af_domain::Credentials;
use af_remote::AgentApi;

use crate::session::ClientSession;

/// Counters exposed on the health endpoint and used by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    /// Sessions currently held.
    pub live: usize,
    /// Sessions ever constructed.
    pub created: u64,
    /// Calls to `resolve`.
    pub resolves: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SessionRegistry {
    api: Arc<dyn AgentApi>,
    sessions: RwLock<HashMap<String, Arc<ClientSession>>>,
    created: AtomicU64,
    resolves: AtomicU64,
}

impl SessionRegistry {
    pub fn new(api: Arc<dyn AgentApi>) -> Self {
        Self {
            api,
            sessions: RwLock::new(HashMap::new()),
            created: AtomicU64::new(0),
            resolves: AtomicU64::new(0),
        }
    }

    /// Return the caller's session, creating it with `credentials` if absent.
    ///
    /// Creation is atomic: concurrent first calls for one caller construct
    /// exactly one session. Credentials on later calls are ignored, so the
    /// first bundle seen for a caller wins until the session is removed.
    pub fn resolve(&self, caller_id: &str, credentials: &Credentials) -> Arc<ClientSession> {
        self.resolves.fetch_add(1, Ordering::Relaxed);
        let (session, is_new) = self.get_or_insert(caller_id, credentials);

        if is_new {
            tracing::info!(caller_id, "client session created");
        }
        TraceEvent::SessionResolved {
            caller_id: caller_id.to_owned(),
            correlation_id: session.correlation_id(),
            is_new,
        }
        .emit();
        session
    }

    /// Lookup-or-create; the flag is true when this call constructed it.
    fn get_or_insert(&self, caller_id: &str, credentials: &Credentials) -> (Arc<ClientSession>, bool) {
        // Fast path: session already exists.
        {
            let sessions = self.sessions.read();
            if let Some(session) = sessions.get(caller_id) {
                return (Arc::clone(session), false);
            }
        }

        // Slow path: re-check under the write lock.
        let mut sessions = self.sessions.write();
        match sessions.get(caller_id) {
            Some(existing) => (Arc::clone(existing), false),
            None => {
                let session = Arc::new(ClientSession::new(
                    caller_id,
                    credentials.clone(),
                    Arc::clone(&self.api),
                ));
                sessions.insert(caller_id.to_owned(), Arc::clone(&session));
                self.created.fetch_add(1, Ordering::Relaxed);
                (session, true)
            }
        }
    }

    /// Look up a session without creating one.
    pub fn peek(&self, caller_id: &str) -> Option<Arc<ClientSession>> {
        self.sessions.read().get(caller_id).cloned()
    }

    /// Reset and drop the caller's session. Returns whether one existed.
    pub fn remove(&self, caller_id: &str) -> bool {
        let removed = self.sessions.write().remove(caller_id);
        match removed {
            Some(session) => {
                session.reset();
                tracing::info!(caller_id, "client session removed");
                TraceEvent::SessionRemoved {
                    caller_id: caller_id.to_owned(),
                }
                .emit();
                true
            }
            None => false,
        }
    }

    /// Reset and drop every session. Returns how many were held.
    pub fn clear_all(&self) -> usize {
        let drained: Vec<Arc<ClientSession>> = {
            let mut sessions = self.sessions.write();
            sessions.drain().map(|(_, s)| s).collect()
        };
        for session in &drained {
            session.reset();
        }

        let count = drained.len();
        tracing::info!(sessions = count, "session registry cleared");
        TraceEvent::RegistryCleared { sessions: count }.emit();
        count
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            live: self.len(),
            created: self.created.load(Ordering::Relaxed),
            resolves: self.resolves.load(Ordering::Relaxed),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
