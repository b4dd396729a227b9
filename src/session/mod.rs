//! Session-scoped conversation logs.
//!
//! Each session owns exactly one conversation, an ordered list of turns held
//! in memory for the lifetime of the process. The store never shares a log
//! between sessions and never persists anything.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// The sender of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation log. Image bytes are not retained, only
/// whether the message carried one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub has_image: bool,
}

impl Turn {
    pub fn user(content: impl Into<String>, has_image: bool) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            has_image,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            has_image: false,
        }
    }
}

#[derive(Default)]
struct Conversation {
    turns: Vec<Turn>,
}

/// In-memory store of conversations keyed by session id.
///
/// The user/assistant pair is appended under a single write guard, so turns
/// from one exchange are never interleaved with another session's writes.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Conversation>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh session id.
    pub fn new_session_id() -> String {
        format!("sess_{}", Uuid::new_v4().simple())
    }

    /// Append a completed exchange to the session's log, creating the
    /// conversation on first use.
    pub async fn append_exchange(&self, session_id: &str, user: Turn, assistant: Turn) {
        let mut sessions = self.inner.write().await;
        let conversation = sessions
            .entry(session_id.to_string())
            .or_default();
        conversation.turns.push(user);
        conversation.turns.push(assistant);
    }

    /// Snapshot of the session's log in chronological order. The snapshot is
    /// a copy; later appends never mutate it. Unknown sessions are empty.
    pub async fn turns(&self, session_id: &str) -> Vec<Turn> {
        let sessions = self.inner.read().await;
        sessions
            .get(session_id)
            .map(|c| c.turns.clone())
            .unwrap_or_default()
    }

    /// Empty the session's log. Clearing an unknown or already-empty session
    /// is a no-op.
    pub async fn clear(&self, session_id: &str) {
        let mut sessions = self.inner.write().await;
        if let Some(conversation) = sessions.get_mut(session_id) {
            conversation.turns.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn turns_are_appended_in_order() {
        let store = SessionStore::new();
        store
            .append_exchange("s1", Turn::user("one", false), Turn::assistant("1"))
            .await;
        store
            .append_exchange("s1", Turn::user("two", true), Turn::assistant("2"))
            .await;

        let turns = store.turns("s1").await;
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0], Turn::user("one", false));
        assert_eq!(turns[1], Turn::assistant("1"));
        assert_eq!(turns[2], Turn::user("two", true));
        assert_eq!(turns[3], Turn::assistant("2"));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new();
        store
            .append_exchange("a", Turn::user("hi", false), Turn::assistant("hello"))
            .await;

        assert_eq!(store.turns("a").await.len(), 2);
        assert!(store.turns("b").await.is_empty());
    }

    #[tokio::test]
    async fn snapshots_are_copy_on_read() {
        let store = SessionStore::new();
        store
            .append_exchange("s", Turn::user("first", false), Turn::assistant("ok"))
            .await;

        let snapshot = store.turns("s").await;
        store
            .append_exchange("s", Turn::user("second", false), Turn::assistant("ok"))
            .await;

        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.turns("s").await.len(), 4);
    }

    #[tokio::test]
    async fn clear_empties_the_log_and_is_idempotent() {
        let store = SessionStore::new();
        store
            .append_exchange("s", Turn::user("hi", false), Turn::assistant("hello"))
            .await;

        store.clear("s").await;
        assert!(store.turns("s").await.is_empty());

        // Clearing again, or clearing a session that never existed, is fine.
        store.clear("s").await;
        store.clear("never-seen").await;
        assert!(store.turns("s").await.is_empty());
    }

    #[test]
    fn turn_serialization_uses_lowercase_roles() {
        let turn = Turn::user("Hello", true);
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"has_image\":true"));

        let parsed: Turn = serde_json::from_str(
            r#"{"role":"assistant","content":"Hi there","has_image":false}"#,
        )
        .unwrap();
        assert_eq!(parsed.role, Role::Assistant);
        assert_eq!(parsed.content, "Hi there");
    }

    #[test]
    fn session_ids_are_unique() {
        let a = SessionStore::new_session_id();
        let b = SessionStore::new_session_id();
        assert!(a.starts_with("sess_"));
        assert_ne!(a, b);
    }
}
