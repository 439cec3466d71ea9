use super::state::Session;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared handle to one session record. Every operation on a session is a
/// read-modify-write under this lock.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Where sessions live. The manager only ever goes through this trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: Session) -> SessionHandle;

    async fn get(&self, id: &str) -> Option<SessionHandle>;

    async fn remove(&self, id: &str) -> Option<SessionHandle>;

    async fn ids(&self) -> Vec<String>;
}

/// In-process store.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: Session) -> SessionHandle {
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .await
            .insert(id, Arc::clone(&handle));
        handle
    }

    async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    async fn remove(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.write().await.remove(id)
    }

    async fn ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let store = MemorySessionStore::new();
        store.insert(Session::new("a")).await;
        store.insert(Session::new("b")).await;

        let mut ids = store.ids().await;
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);

        let handle = store.get("a").await.unwrap();
        assert_eq!(handle.lock().await.id, "a");

        assert!(store.remove("a").await.is_some());
        assert!(store.get("a").await.is_none());
        assert!(store.remove("a").await.is_none());
    }
}
