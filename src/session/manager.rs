use super::state::{Session, SessionEvent};
use super::store::{MemorySessionStore, SessionStore};
use crate::mcp::protocol::JsonRpcRequest;
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Session Manager - creates, validates and expires client sessions
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    max_age: Duration,
}

impl SessionManager {
    pub fn new(max_age: Duration) -> Self {
        Self::with_store(Arc::new(MemorySessionStore::new()), max_age)
    }

    pub fn with_store(store: Arc<dyn SessionStore>, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Issues a fresh session token.
    pub async fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.store.insert(Session::new(id.clone())).await;
        info!("Created session {}", id);
        id
    }

    /// Runs `f` on a live session under its lock.
    ///
    /// An expired session is evicted here and reported as invalid.
    async fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut Session) -> T) -> Result<T> {
        let handle = self
            .store
            .get(id)
            .await
            .ok_or_else(|| Error::InvalidSession(id.to_string()))?;

        let mut session = handle.lock().await;
        if session.is_expired(self.max_age) {
            drop(session);
            self.store.remove(id).await;
            info!("Session {} expired", id);
            return Err(Error::InvalidSession(id.to_string()));
        }

        Ok(f(&mut session))
    }

    pub async fn add_request(&self, id: &str, request: JsonRpcRequest) -> Result<()> {
        self.with_session(id, |session| {
            session.enqueue(request);
            session.touch();
        })
        .await?;
        debug!("Queued request for session {}", id);
        Ok(())
    }

    /// Dequeues the oldest pending request.
    pub async fn get_next_request(&self, id: &str) -> Result<Option<JsonRpcRequest>> {
        self.with_session(id, |session| {
            session.touch();
            session.dequeue()
        })
        .await
    }

    pub async fn is_valid(&self, id: &str) -> bool {
        self.with_session(id, |_| ()).await.is_ok()
    }

    pub async fn touch(&self, id: &str) -> Result<()> {
        self.with_session(id, Session::touch).await
    }

    /// Evicts every session older than `max_age`. Returns how many went.
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        let mut removed = 0;
        for id in self.store.ids().await {
            let Some(handle) = self.store.get(&id).await else {
                continue;
            };
            let expired = handle.lock().await.is_expired(max_age);
            if expired && self.store.remove(&id).await.is_some() {
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Cleaned up {} expired session(s)", removed);
        }
        removed
    }

    pub async fn cleanup_expired(&self) -> usize {
        self.cleanup(self.max_age).await
    }

    pub async fn destroy(&self, id: &str) -> bool {
        let removed = self.store.remove(id).await.is_some();
        if removed {
            info!("Destroyed session {}", id);
        }
        removed
    }

    /// Appends a delivered response to the session outbox.
    pub async fn push_event(&self, id: &str, payload: Value) -> Result<u64> {
        self.with_session(id, |session| session.push_event(payload))
            .await
    }

    pub async fn events_after(&self, id: &str, cursor: u64) -> Result<Vec<SessionEvent>> {
        self.with_session(id, |session| {
            session.touch();
            session.events_after(cursor)
        })
        .await
    }

    /// Signalled whenever the session outbox grows.
    pub async fn notifier(&self, id: &str) -> Result<Arc<Notify>> {
        self.with_session(id, |session| session.notifier()).await
    }

    pub async fn session_count(&self) -> usize {
        self.store.ids().await.len()
    }

    /// Sweeps expired sessions every `interval` until the task is aborted.
    pub fn start_cleanup_task(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                manager.cleanup_expired().await;
            }
        })
    }
}
