//! Wire event types and serialization
//!
//! Defines all client-to-server and server-to-client event types
//! with type-safe serde serialization. Events travel as JSON text frames
//! tagged by `type`; payload keys are camelCase.

use serde::{Deserialize, Serialize};

use motorsouk_shared::{AuthUser, ChatId, ChatMessage, ListingId, MessageType, UserId};

// =============================================================================
// Client-to-Server Events
// =============================================================================

/// Events emitted by the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Authenticate the connection with the session bearer token
    Authenticate { token: String },

    /// Join a chat conversation room
    #[serde(rename_all = "camelCase")]
    JoinChat { chat_id: ChatId },

    /// Join the room scoped to a product listing
    #[serde(rename_all = "camelCase")]
    JoinProductChat { product_id: ListingId },

    /// Leave a chat conversation room
    #[serde(rename_all = "camelCase")]
    LeaveChat { chat_id: ChatId },

    /// Start typing in a chat
    #[serde(rename_all = "camelCase")]
    TypingStart {
        chat_id: ChatId,
        #[serde(skip_serializing_if = "Option::is_none")]
        product_id: Option<ListingId>,
    },

    /// Stop typing in a chat
    #[serde(rename_all = "camelCase")]
    TypingStop {
        chat_id: ChatId,
        #[serde(skip_serializing_if = "Option::is_none")]
        product_id: Option<ListingId>,
    },

    /// Send a chat message
    #[serde(rename_all = "camelCase")]
    SendMessage {
        chat_id: ChatId,
        #[serde(skip_serializing_if = "Option::is_none")]
        product_id: Option<ListingId>,
        message: String,
        message_type: MessageType,
    },
}

// =============================================================================
// Server-to-Client Events
// =============================================================================

/// Events delivered by the server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Connection authenticated
    Authenticated { user: AuthUser },

    /// Authentication rejected
    AuthenticationError { message: String },

    /// New message delivered to a joined room
    #[serde(rename_all = "camelCase")]
    NewMessage { chat_id: ChatId, message: ChatMessage },

    /// A participant started or stopped typing
    #[serde(rename_all = "camelCase")]
    UserTyping {
        chat_id: ChatId,
        user_id: UserId,
        #[serde(default)]
        user_name: Option<String>,
        is_typing: bool,
    },

    /// Server-side error
    Error { message: String },
}
