//! Process-wide chat client registry
//!
//! Simultaneously mounted chat views share one connection per session
//! instead of dialing independently. The registry hands out `Arc` handles
//! keyed by user id and holds only weak references, so the client (and its
//! driver task) is torn down when the last view releases its handle.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::Mutex;

use motorsouk_shared::{Session, UserId};

use crate::client::ChatClient;
use crate::config::RealtimeConfig;

pub struct ClientRegistry {
    config: RealtimeConfig,
    clients: Mutex<HashMap<UserId, Weak<ChatClient>>>,
}

impl ClientRegistry {
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Get the shared client for this session, connecting if no view holds
    /// one yet.
    pub async fn acquire(&self, session: Session) -> Arc<ChatClient> {
        let user_id = session.user_id();
        let mut clients = self.clients.lock().await;
        clients.retain(|_, weak| weak.strong_count() > 0);

        if let Some(existing) = clients.get(&user_id).and_then(Weak::upgrade) {
            tracing::debug!(user_id = %user_id, "Reusing shared chat client");
            return existing;
        }

        let client = Arc::new(ChatClient::connect(self.config.clone(), session));
        clients.insert(user_id, Arc::downgrade(&client));
        tracing::info!(
            user_id = %user_id,
            active_clients = clients.len(),
            "Created shared chat client"
        );
        client
    }

    /// Number of sessions with a live client
    pub async fn active_count(&self) -> usize {
        let mut clients = self.clients.lock().await;
        clients.retain(|_, weak| weak.strong_count() > 0);
        clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motorsouk_shared::{AuthUser, UserRole};

    fn test_registry() -> ClientRegistry {
        ClientRegistry::new(RealtimeConfig {
            endpoint: "ws://127.0.0.1:1".to_string(),
            reconnect_max_attempts: 1,
            reconnect_base_delay_ms: 1,
            reconnect_max_delay_ms: 5,
        })
    }

    fn session_for(user_id: UserId) -> Session {
        Session::new(
            AuthUser {
                id: user_id,
                email: "buyer@example.com".to_string(),
                first_name: None,
                last_name: None,
                role: UserRole::Buyer,
            },
            "test-token",
        )
    }

    #[tokio::test]
    async fn test_same_session_shares_one_client() {
        let registry = test_registry();
        let user_id = UserId::new();

        let first = registry.acquire(session_for(user_id)).await;
        let second = registry.acquire(session_for(user_id)).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_sessions_get_distinct_clients() {
        let registry = test_registry();

        let first = registry.acquire(session_for(UserId::new())).await;
        let second = registry.acquire(session_for(UserId::new())).await;

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(registry.active_count().await, 2);
    }

    #[tokio::test]
    async fn test_client_torn_down_after_last_release() {
        let registry = test_registry();
        let user_id = UserId::new();

        let first = registry.acquire(session_for(user_id)).await;
        let second = registry.acquire(session_for(user_id)).await;

        drop(first);
        assert_eq!(registry.active_count().await, 1);

        drop(second);
        assert_eq!(registry.active_count().await, 0);

        // A new acquire creates a fresh client
        let fresh = registry.acquire(session_for(user_id)).await;
        assert_eq!(registry.active_count().await, 1);
        drop(fresh);
    }
}
