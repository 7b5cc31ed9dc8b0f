use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::models::{ChatSession, GuardianMessage};

/// Shared handle to one session. Holding its lock serializes turns for that id.
pub type SessionHandle = Arc<Mutex<ChatSession>>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Option<SessionHandle>;

    /// Returns the existing session or creates an empty one. Idempotent.
    async fn get_or_create(&self, session_id: &str) -> SessionHandle;

    /// Returns whether a session was removed.
    async fn delete(&self, session_id: &str) -> bool;

    async fn append_message(&self, session_id: &str, message: GuardianMessage);
}

/// Process-memory sessions. No expiry: sessions live until cleared or restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(existing) = self.get(session_id).await {
            return existing;
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!("Creating guardian session {}", session_id);
                Arc::new(Mutex::new(ChatSession::new(session_id)))
            })
            .clone()
    }

    async fn delete(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    async fn append_message(&self, session_id: &str, message: GuardianMessage) {
        let session = self.get_or_create(session_id).await;
        session.lock().await.messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let store = InMemorySessionStore::new();
        let first = store.get_or_create("s1").await;
        let second = store.get_or_create("s1").await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn get_does_not_create() {
        let store = InMemorySessionStore::new();
        assert!(store.get("missing").await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn append_and_delete() {
        let store = InMemorySessionStore::new();
        store
            .append_message("s2", GuardianMessage::user("hello"))
            .await;
        let session = store.get("s2").await.expect("session");
        assert_eq!(session.lock().await.messages.len(), 1);

        assert!(store.delete("s2").await);
        assert!(!store.delete("s2").await);
        assert!(store.get("s2").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append_message("shared", GuardianMessage::user(format!("m{}", i)))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.expect("task");
        }
        let session = store.get("shared").await.expect("session");
        assert_eq!(session.lock().await.messages.len(), 20);
    }
}
