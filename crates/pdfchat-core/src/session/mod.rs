//! Session registry
//!
//! In-process mapping from opaque session identifiers to per-document
//! state: the vector namespace and the conversation history. Sessions
//! live for the lifetime of the process; the [`SessionStore`] trait
//! keeps the registry swappable for a real datastore later.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Role tag for one conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One message in a session's conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// One uploaded document's conversational state
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub namespace: String,
    pub history: Vec<Turn>,
}

impl Session {
    /// Create a fresh session with a random collision-resistant id
    /// and a namespace derived from it
    pub fn new() -> Self {
        let id = Uuid::new_v4().to_string();
        let namespace = format!("doc-{}", id);
        Self {
            id,
            namespace,
            history: Vec::new(),
        }
    }

    /// Append a question/answer pair, user turn first
    pub fn record_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.history.push(Turn::user(question));
        self.history.push(Turn::model(answer));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a session; the mutex serializes question handling within
/// one session while leaving other sessions fully parallel
pub type SessionHandle = Arc<Mutex<Session>>;

/// Session registry operations
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session by id
    async fn get(&self, id: &str) -> Option<SessionHandle>;

    /// Register a session, returning its handle
    async fn put(&self, session: Session) -> SessionHandle;

    /// Remove a session; true if it existed
    async fn delete(&self, id: &str) -> bool;

    /// Number of live sessions
    async fn len(&self) -> usize;
}

/// In-memory session registry; state is lost on restart
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    async fn put(&self, session: Session) -> SessionHandle {
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        handle
    }

    async fn delete(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sessions_get_distinct_ids_and_namespaces() {
        let a = Session::new();
        let b = Session::new();
        assert_ne!(a.id, b.id);
        assert_ne!(a.namespace, b.namespace);
        assert_eq!(a.namespace, format!("doc-{}", a.id));
        assert!(a.history.is_empty());
    }

    #[test]
    fn test_record_exchange_appends_user_then_model() {
        let mut session = Session::new();
        session.record_exchange("q1", "a1");
        session.record_exchange("q2", "a2");

        assert_eq!(session.history.len(), 4);
        assert_eq!(session.history[0].role, Role::User);
        assert_eq!(session.history[0].text, "q1");
        assert_eq!(session.history[1].role, Role::Model);
        assert_eq!(session.history[1].text, "a1");
        assert_eq!(session.history[2].role, Role::User);
        assert_eq!(session.history[3].role, Role::Model);
    }

    #[tokio::test]
    async fn test_store_put_get_delete() {
        let store = InMemorySessionStore::new();
        let session = Session::new();
        let id = session.id.clone();

        store.put(session).await;
        assert_eq!(store.len().await, 1);
        assert!(store.get(&id).await.is_some());
        assert!(store.get("unknown").await.is_none());

        assert!(store.delete(&id).await);
        assert!(!store.delete(&id).await);
        assert_eq!(store.len().await, 0);
    }

    #[test]
    fn test_turn_role_serializes_lowercase() {
        let turn = Turn::model("hello");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "model");
    }
}
