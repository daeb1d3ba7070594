//! Chat client and connection driver
//!
//! One [`ChatClient`] per authenticated session. The client spawns a single
//! driver task that dials the endpoint, authenticates with the session
//! bearer token, pumps outbound emissions and inbound events, and
//! reconnects with capped, jittered exponential backoff when the transport
//! drops. Teardown aborts the driver unconditionally; there is no graceful
//! drain.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use motorsouk_shared::{ChatId, ChatMessage, ListingId, MessageType, Session};

use crate::config::RealtimeConfig;
use crate::connection::{ConnectionHandle, ConnectionState};
use crate::dispatch::{Dispatcher, Subscription};
use crate::events::{ClientEvent, ServerEvent};
use crate::rooms::RoomTracker;
use crate::typing::{TypingEvent, TypingRegistry, TypingUser};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = futures::stream::SplitSink<WsStream, Message>;

/// An inbound message with its owning chat
#[derive(Debug, Clone)]
pub struct MessageDelivery {
    pub chat_id: ChatId,
    pub message: ChatMessage,
}

/// State shared between the client facade and its driver task
struct ClientShared {
    config: RealtimeConfig,
    token: String,
    state_tx: watch::Sender<ConnectionState>,
    rooms: RoomTracker,
    typing: TypingRegistry,
    messages: Dispatcher<MessageDelivery>,
    typing_events: Dispatcher<TypingEvent>,
}

impl ClientShared {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::debug!(from = ?previous, to = ?state, "Connection state changed");
        }
    }

    /// Apply one inbound server event to client state and subscribers
    async fn apply(&self, event: ServerEvent) {
        match event {
            ServerEvent::Authenticated { user } => {
                tracing::info!(user_id = %user.id, "Connection authenticated");
            }

            // Logged only; authentication is not retried by this module
            ServerEvent::AuthenticationError { message } => {
                tracing::error!(message = %message, "Authentication rejected");
            }

            ServerEvent::NewMessage { chat_id, message } => {
                tracing::debug!(
                    chat_id = %chat_id,
                    message_id = %message.id,
                    "Message delivered"
                );
                self.messages
                    .broadcast(MessageDelivery { chat_id, message })
                    .await;
            }

            ServerEvent::UserTyping {
                chat_id,
                user_id,
                user_name,
                is_typing,
            } => {
                if is_typing {
                    let user = TypingUser::from_display_name(user_id, user_name.as_deref());
                    self.typing.apply_start(chat_id, user.clone()).await;
                    self.typing_events
                        .broadcast(TypingEvent {
                            chat_id,
                            user,
                            started: true,
                        })
                        .await;
                } else if let Some(user) = self.typing.apply_stop(chat_id, user_id).await {
                    self.typing_events
                        .broadcast(TypingEvent {
                            chat_id,
                            user,
                            started: false,
                        })
                        .await;
                }
            }

            ServerEvent::Error { message } => {
                tracing::error!(message = %message, "Server error");
            }
        }
    }
}

/// How one connection session ended
enum SessionEnd {
    /// Transport dropped or never came up; reconnect applies
    Dropped { was_connected: bool },
}

/// The realtime chat client for one authenticated session
pub struct ChatClient {
    session: Session,
    handle: ConnectionHandle,
    shared: Arc<ClientShared>,
    driver: JoinHandle<()>,
}

impl ChatClient {
    /// Create the client and start its connection driver.
    ///
    /// The driver dials immediately and keeps the connection alive until
    /// [`shutdown`](Self::shutdown) or drop.
    pub fn connect(config: RealtimeConfig, session: Session) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle::new(out_tx, state_rx);

        let shared = Arc::new(ClientShared {
            config,
            token: session.token().to_string(),
            state_tx,
            rooms: RoomTracker::new(handle.clone()),
            typing: TypingRegistry::new(),
            messages: Dispatcher::new(),
            typing_events: Dispatcher::new(),
        });

        let driver = tokio::spawn(driver_loop(Arc::clone(&shared), out_rx));

        tracing::info!(
            user_id = %session.user_id(),
            endpoint = %shared.config.endpoint,
            "Chat client started"
        );

        Self {
            session,
            handle,
            shared,
            driver,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.handle.state()
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_connected()
    }

    /// Watch receiver for connection state transitions
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.handle.watch_state()
    }

    /// Join a chat room, plus the listing room when a listing is involved
    pub async fn join_chat(&self, chat_id: ChatId, listing_id: Option<ListingId>) {
        self.shared.rooms.join_chat(chat_id, listing_id).await;
    }

    /// Leave a chat room
    pub async fn leave_chat(&self, chat_id: ChatId) {
        self.shared.rooms.leave_chat(chat_id).await;
    }

    /// Announce that the local user started composing
    pub fn typing_start(&self, chat_id: ChatId, product_id: Option<ListingId>) {
        self.handle.emit(ClientEvent::TypingStart {
            chat_id,
            product_id,
        });
    }

    /// Announce that the local user stopped composing
    pub fn typing_stop(&self, chat_id: ChatId, product_id: Option<ListingId>) {
        self.handle.emit(ClientEvent::TypingStop {
            chat_id,
            product_id,
        });
    }

    /// Fire-and-forget message send. Dropped with a warning while
    /// disconnected; the caller surfaces that to the user.
    pub fn send_message(
        &self,
        chat_id: ChatId,
        message: impl Into<String>,
        message_type: MessageType,
        listing_id: Option<ListingId>,
    ) -> bool {
        self.handle.emit(ClientEvent::SendMessage {
            chat_id,
            product_id: listing_id,
            message: message.into(),
            message_type,
        })
    }

    /// Currently-typing users for one chat, insertion-ordered
    pub async fn typing_users(&self, chat_id: ChatId) -> Vec<TypingUser> {
        self.shared.typing.users_for(chat_id).await
    }

    /// Subscribe to inbound message deliveries
    pub async fn subscribe_messages(&self) -> Subscription<MessageDelivery> {
        self.shared.messages.subscribe().await
    }

    /// Subscribe to typing start/stop transitions
    pub async fn subscribe_typing(&self) -> Subscription<TypingEvent> {
        self.shared.typing_events.subscribe().await
    }

    /// Tear the connection down unconditionally
    pub fn shutdown(&self) {
        self.driver.abort();
        self.shared.set_state(ConnectionState::Disconnected);
        tracing::info!(user_id = %self.session.user_id(), "Chat client shut down");
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// Connection driver
// =============================================================================

async fn driver_loop(shared: Arc<ClientShared>, mut out_rx: mpsc::UnboundedReceiver<ClientEvent>) {
    let mut schedule = shared.config.backoff_schedule();
    let mut attempt: u32 = 0;

    loop {
        let SessionEnd::Dropped { was_connected } = run_session(&shared, &mut out_rx).await;

        if was_connected {
            // A successful session resets the backoff cycle
            schedule = shared.config.backoff_schedule();
            attempt = 0;
        }

        match schedule.next() {
            Some(delay) => {
                attempt += 1;
                shared.set_state(ConnectionState::Reconnecting { attempt });
                tracing::info!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Reconnecting after transport loss"
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                tracing::error!(
                    max_attempts = shared.config.reconnect_max_attempts,
                    "Reconnect attempts exhausted"
                );
                shared.set_state(ConnectionState::Disconnected);
                return;
            }
        }
    }
}

/// Run one connect-authenticate-pump session to completion
async fn run_session(
    shared: &ClientShared,
    out_rx: &mut mpsc::UnboundedReceiver<ClientEvent>,
) -> SessionEnd {
    let (stream, _) = match connect_async(shared.config.endpoint.as_str()).await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(
                error = ?e,
                endpoint = %shared.config.endpoint,
                "Transport connect failed"
            );
            return SessionEnd::Dropped {
                was_connected: false,
            };
        }
    };

    tracing::info!(endpoint = %shared.config.endpoint, "Transport connected");
    let (mut sink, mut source) = stream.split();

    // Authenticate before anything else goes out
    let authenticate = ClientEvent::Authenticate {
        token: shared.token.clone(),
    };
    if send_event(&mut sink, &authenticate).await.is_err() {
        tracing::error!("Failed to send authenticate frame");
        return SessionEnd::Dropped {
            was_connected: false,
        };
    }

    // Emissions raced against the previous disconnect are dropped, not
    // replayed against the new connection
    while out_rx.try_recv().is_ok() {}

    shared.set_state(ConnectionState::Connected);
    shared.rooms.replay_joins().await;

    loop {
        tokio::select! {
            outbound = out_rx.recv() => match outbound {
                Some(event) => {
                    if send_event(&mut sink, &event).await.is_err() {
                        tracing::warn!("Transport write failed");
                        break;
                    }
                }
                // All emission handles are gone
                None => break,
            },
            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => shared.apply(event).await,
                        Err(e) => {
                            tracing::warn!(
                                error = ?e,
                                frame = %text,
                                "Failed to parse server event"
                            );
                        }
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    tracing::info!("Close frame received");
                    break;
                }
                // Ping/pong answered by tungstenite; binary frames ignored
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!(error = ?e, "Transport error");
                    break;
                }
                None => break,
            },
        }
    }

    // Pending stop events are lost with the connection
    shared.typing.clear().await;

    SessionEnd::Dropped {
        was_connected: true,
    }
}

async fn send_event(
    sink: &mut WsSink,
    event: &ClientEvent,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = ?e, "Failed to serialize client event");
            return Ok(());
        }
    };
    sink.send(Message::Text(json)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use motorsouk_shared::{AuthUser, MessageType, UserId, UserRole};
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn test_config() -> RealtimeConfig {
        RealtimeConfig {
            endpoint: "ws://127.0.0.1:1".to_string(),
            reconnect_max_attempts: 1,
            reconnect_base_delay_ms: 1,
            reconnect_max_delay_ms: 5,
        }
    }

    fn test_session() -> Session {
        Session::new(
            AuthUser {
                id: UserId::new(),
                email: "buyer@example.com".to_string(),
                first_name: Some("Lina".to_string()),
                last_name: Some("Khouri".to_string()),
                role: UserRole::Buyer,
            },
            "test-token",
        )
    }

    fn test_shared() -> ClientShared {
        let (state_tx, _state_rx) = watch::channel(ConnectionState::Disconnected);
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle::new(out_tx, state_tx.subscribe());
        ClientShared {
            config: test_config(),
            token: "test-token".to_string(),
            state_tx,
            rooms: RoomTracker::new(handle),
            typing: TypingRegistry::new(),
            messages: Dispatcher::new(),
            typing_events: Dispatcher::new(),
        }
    }

    fn message(chat_id: ChatId) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            chat_id,
            sender_id: Some(UserId::new()),
            sender_name: Some("Omar Haddad".to_string()),
            content: "Is the car still available?".to_string(),
            message_type: MessageType::Text,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn test_new_message_reaches_all_subscribers() {
        let shared = test_shared();
        let mut first = shared.messages.subscribe().await;
        let mut second = shared.messages.subscribe().await;
        let chat_id = ChatId::new();

        shared
            .apply(ServerEvent::NewMessage {
                chat_id,
                message: message(chat_id),
            })
            .await;

        assert_eq!(first.try_recv().unwrap().chat_id, chat_id);
        assert_eq!(second.try_recv().unwrap().chat_id, chat_id);
    }

    #[tokio::test]
    async fn test_typing_start_updates_registry_and_notifies() {
        let shared = test_shared();
        let mut events = shared.typing_events.subscribe().await;
        let chat_id = ChatId::new();
        let user_id = UserId::new();

        shared
            .apply(ServerEvent::UserTyping {
                chat_id,
                user_id,
                user_name: Some("Omar Haddad".to_string()),
                is_typing: true,
            })
            .await;

        let users = shared.typing.users_for(chat_id).await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].first_name, "Omar");

        let event = events.try_recv().unwrap();
        assert!(event.started);
        assert_eq!(event.user.user_id, user_id);
    }

    #[tokio::test]
    async fn test_typing_stop_removes_and_notifies() {
        let shared = test_shared();
        let chat_id = ChatId::new();
        let user_id = UserId::new();

        shared
            .apply(ServerEvent::UserTyping {
                chat_id,
                user_id,
                user_name: Some("Omar".to_string()),
                is_typing: true,
            })
            .await;

        let mut events = shared.typing_events.subscribe().await;
        shared
            .apply(ServerEvent::UserTyping {
                chat_id,
                user_id,
                user_name: None,
                is_typing: false,
            })
            .await;

        assert!(shared.typing.users_for(chat_id).await.is_empty());
        let event = events.try_recv().unwrap();
        assert!(!event.started);
    }

    #[tokio::test]
    async fn test_typing_stop_for_unknown_user_notifies_nobody() {
        let shared = test_shared();
        let mut events = shared.typing_events.subscribe().await;

        shared
            .apply(ServerEvent::UserTyping {
                chat_id: ChatId::new(),
                user_id: UserId::new(),
                user_name: None,
                is_typing: false,
            })
            .await;

        assert!(events.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_auth_error_and_server_error_are_logged_only() {
        let shared = test_shared();
        shared
            .apply(ServerEvent::AuthenticationError {
                message: "token expired".to_string(),
            })
            .await;
        shared
            .apply(ServerEvent::Error {
                message: "room not found".to_string(),
            })
            .await;
        // No state to assert; the events must simply not panic or propagate
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_dropped_not_error() {
        let client = ChatClient::connect(test_config(), test_session());

        // Endpoint is unreachable, so the client is not connected
        assert!(!client.is_connected());
        let sent = client.send_message(ChatId::new(), "hello", MessageType::Text, None);
        assert!(!sent);

        client.shutdown();
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_join_while_disconnected_tracks_nothing() {
        let client = ChatClient::connect(test_config(), test_session());

        client.join_chat(ChatId::new(), Some(ListingId::new())).await;
        assert!(client.typing_users(ChatId::new()).await.is_empty());
        assert_eq!(client.shared.rooms.joined_count().await, 0);
    }
}
