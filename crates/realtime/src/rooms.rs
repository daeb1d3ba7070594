//! Room membership tracking
//!
//! Emits join/leave requests for chat rooms and listing-scoped rooms.
//! Membership is authoritative on the server; the local set exists only so
//! joins can be replayed after a reconnect. Joins are idempotent server
//! side, so replaying is safe.

use std::collections::HashSet;

use tokio::sync::RwLock;

use motorsouk_shared::{ChatId, ListingId};

use crate::connection::ConnectionHandle;
use crate::events::ClientEvent;

/// A server-side room the client has asked to join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Room {
    Chat(ChatId),
    Listing(ListingId),
}

impl Room {
    fn join_event(&self) -> ClientEvent {
        match *self {
            Room::Chat(chat_id) => ClientEvent::JoinChat { chat_id },
            Room::Listing(product_id) => ClientEvent::JoinProductChat { product_id },
        }
    }
}

/// Tracks requested room memberships for one connection
pub struct RoomTracker {
    handle: ConnectionHandle,
    joined: RwLock<HashSet<Room>>,
}

impl RoomTracker {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            joined: RwLock::new(HashSet::new()),
        }
    }

    /// Request to join a chat room and, when a listing is involved, the
    /// listing-scoped room as well. No-op with a warning while disconnected.
    pub async fn join_chat(&self, chat_id: ChatId, listing_id: Option<ListingId>) {
        self.join(Room::Chat(chat_id)).await;
        if let Some(listing_id) = listing_id {
            self.join(Room::Listing(listing_id)).await;
        }
    }

    /// Request to leave a chat room. No-op with a warning while disconnected.
    pub async fn leave_chat(&self, chat_id: ChatId) {
        if !self.handle.emit(ClientEvent::LeaveChat { chat_id }) {
            return;
        }

        let mut joined = self.joined.write().await;
        joined.remove(&Room::Chat(chat_id));
        tracing::debug!(chat_id = %chat_id, "Left chat room");
    }

    async fn join(&self, room: Room) {
        if !self.handle.emit(room.join_event()) {
            return;
        }

        let mut joined = self.joined.write().await;
        joined.insert(room);
        tracing::debug!(room = ?room, room_count = joined.len(), "Joined room");
    }

    /// Re-emit join requests for every tracked room after a reconnect
    pub async fn replay_joins(&self) {
        let joined = self.joined.read().await;
        if joined.is_empty() {
            return;
        }

        tracing::info!(room_count = joined.len(), "Replaying room joins");
        for room in joined.iter() {
            self.handle.emit(room.join_event());
        }
    }

    pub async fn joined_count(&self) -> usize {
        self.joined.read().await.len()
    }
}
