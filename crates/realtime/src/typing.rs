//! Typing presence aggregation
//!
//! Tracks who is currently composing a message, partitioned per chat and
//! keyed by user id. Entries are added on server-driven start events and
//! removed only on matching stop events; there is deliberately no
//! client-side timeout fallback. The registry is cleared wholesale when the
//! connection drops, since any pending stop events are lost with it.

use std::collections::HashMap;

use tokio::sync::RwLock;

use motorsouk_shared::{ChatId, UserId};

/// A participant currently typing in one chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingUser {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
}

impl TypingUser {
    /// Build from a wire display name, split on the first whitespace
    /// boundary. An absent or empty name falls back to "User".
    pub fn from_display_name(user_id: UserId, display_name: Option<&str>) -> Self {
        let trimmed = display_name.unwrap_or("").trim();
        if trimmed.is_empty() {
            return Self {
                user_id,
                first_name: "User".to_string(),
                last_name: String::new(),
            };
        }

        match trimmed.split_once(char::is_whitespace) {
            Some((first, rest)) => Self {
                user_id,
                first_name: first.to_string(),
                last_name: rest.trim_start().to_string(),
            },
            None => Self {
                user_id,
                first_name: trimmed.to_string(),
                last_name: String::new(),
            },
        }
    }
}

/// Typing transition pushed to subscribers
#[derive(Debug, Clone)]
pub struct TypingEvent {
    pub chat_id: ChatId,
    pub user: TypingUser,
    pub started: bool,
}

/// Per-chat sets of currently-typing users, insertion-ordered
pub struct TypingRegistry {
    by_chat: RwLock<HashMap<ChatId, Vec<TypingUser>>>,
}

impl TypingRegistry {
    pub fn new() -> Self {
        Self {
            by_chat: RwLock::new(HashMap::new()),
        }
    }

    /// Upsert a typing user. A repeat start for the same user replaces the
    /// prior entry in place, keeping its position in the sequence.
    pub async fn apply_start(&self, chat_id: ChatId, user: TypingUser) {
        let mut by_chat = self.by_chat.write().await;
        let entries = by_chat.entry(chat_id).or_default();

        if let Some(existing) = entries.iter_mut().find(|u| u.user_id == user.user_id) {
            *existing = user;
        } else {
            tracing::debug!(
                chat_id = %chat_id,
                user_id = %user.user_id,
                typing_count = entries.len() + 1,
                "User started typing"
            );
            entries.push(user);
        }
    }

    /// Remove a typing user. Removing a user never recorded as typing is a
    /// no-op; returns the removed entry when there was one.
    pub async fn apply_stop(&self, chat_id: ChatId, user_id: UserId) -> Option<TypingUser> {
        let mut by_chat = self.by_chat.write().await;
        let entries = by_chat.get_mut(&chat_id)?;

        let position = entries.iter().position(|u| u.user_id == user_id)?;
        let removed = entries.remove(position);

        if entries.is_empty() {
            by_chat.remove(&chat_id);
        }

        tracing::debug!(
            chat_id = %chat_id,
            user_id = %user_id,
            "User stopped typing"
        );
        Some(removed)
    }

    /// Currently-typing users for one chat, in insertion order
    pub async fn users_for(&self, chat_id: ChatId) -> Vec<TypingUser> {
        let by_chat = self.by_chat.read().await;
        by_chat.get(&chat_id).cloned().unwrap_or_default()
    }

    /// Drop all entries. Called when the connection is lost; stop events
    /// for these users can no longer arrive.
    pub async fn clear(&self) {
        let mut by_chat = self.by_chat.write().await;
        if !by_chat.is_empty() {
            tracing::debug!(chat_count = by_chat.len(), "Cleared typing presence");
            by_chat.clear();
        }
    }
}

impl Default for TypingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
