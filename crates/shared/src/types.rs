//! Common types used across the motorsouk client

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// ID Wrappers
// =============================================================================

/// Chat conversation ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub Uuid);

impl ChatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ChatId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Product listing ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub Uuid);

impl ListingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ListingId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// User ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Identity & Session
// =============================================================================

/// Marketplace role attached to an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Buyer,
    Seller,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Buyer => write!(f, "BUYER"),
            UserRole::Seller => write!(f, "SELLER"),
            UserRole::Admin => write!(f, "ADMIN"),
        }
    }
}

/// Authenticated account identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub role: UserRole,
}

/// Authenticated identity plus credential accessor for the current tab.
///
/// The realtime module holds a read-only reference to this for the lifetime
/// of a connection; it never refreshes or mutates the token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: AuthUser,
    access_token: String,
}

impl Session {
    pub fn new(user: AuthUser, access_token: impl Into<String>) -> Self {
        Self {
            user,
            access_token: access_token.into(),
        }
    }

    /// Bearer token for transport authentication
    pub fn token(&self) -> &str {
        &self.access_token
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

// =============================================================================
// Chat Messages
// =============================================================================

/// Wire message kind, SCREAMING_SNAKE_CASE on the wire (`TEXT` is default)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Offer,
    System,
}

/// An application chat message as delivered by the server.
///
/// Not persisted by the realtime module; history retrieval goes through a
/// separate request channel owned by the surrounding view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: ChatId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_values() {
        assert_eq!(serde_json::to_string(&UserRole::Seller).unwrap(), r#""SELLER""#);
        assert_eq!(
            serde_json::from_str::<UserRole>(r#""BUYER""#).unwrap(),
            UserRole::Buyer
        );
    }

    #[test]
    fn test_message_type_defaults_to_text() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "chatId": "550e8400-e29b-41d4-a716-446655440001",
            "content": "hello",
            "createdAt": "2026-01-15T10:30:00Z"
        }"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.message_type, MessageType::Text);
        assert!(msg.sender_id.is_none());
    }

    #[test]
    fn test_session_token_accessor() {
        let user = AuthUser {
            id: UserId::new(),
            email: "seller@example.com".to_string(),
            first_name: Some("Aisha".to_string()),
            last_name: Some("Rahman".to_string()),
            role: UserRole::Seller,
        };
        let session = Session::new(user, "bearer-token");
        assert_eq!(session.token(), "bearer-token");
        assert_eq!(session.role(), UserRole::Seller);
    }
}
