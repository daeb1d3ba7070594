//! Connection state and the outbound emission handle
//!
//! The driver task owns the socket; everything else talks to it through a
//! [`ConnectionHandle`], which gates emissions on the observable connection
//! state. Attempting to emit while not connected drops the event with a
//! warning, matching the fire-and-forget contract of the chat module.

use tokio::sync::{mpsc, watch};

use crate::events::ClientEvent;

/// Observable lifecycle of the chat connection.
///
/// Reconnection walks `Connected -> Reconnecting { attempt } -> Connected`
/// until the attempt cap is reached, then settles on `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Reconnecting { attempt: u32 },
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Cheap, cloneable handle for emitting events toward the driver task
#[derive(Clone)]
pub struct ConnectionHandle {
    outbound: mpsc::UnboundedSender<ClientEvent>,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    pub fn new(
        outbound: mpsc::UnboundedSender<ClientEvent>,
        state: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self { outbound, state }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Watch receiver for state transitions (UI connectivity banners)
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Emit an event toward the server.
    ///
    /// Returns `false` when the connection is not in the connected state or
    /// the driver task is gone; the event is dropped, never queued.
    pub fn emit(&self, event: ClientEvent) -> bool {
        if !self.is_connected() {
            tracing::warn!(
                event = ?event,
                state = ?self.state(),
                "Dropping emission while not connected"
            );
            return false;
        }

        if self.outbound.send(event).is_err() {
            tracing::warn!("Dropping emission: connection driver is gone");
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motorsouk_shared::ChatId;

    fn handle_with_state(
        state: ConnectionState,
    ) -> (ConnectionHandle, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(state);
        // The last value stays readable after the sender drops
        drop(state_tx);
        (ConnectionHandle::new(tx, state_rx), rx)
    }

    #[tokio::test]
    async fn test_emit_while_disconnected_is_dropped() {
        let (handle, mut rx) = handle_with_state(ConnectionState::Disconnected);

        let sent = handle.emit(ClientEvent::JoinChat {
            chat_id: ChatId::new(),
        });

        assert!(!sent);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_emit_while_reconnecting_is_dropped() {
        let (handle, mut rx) = handle_with_state(ConnectionState::Reconnecting { attempt: 2 });

        assert!(!handle.emit(ClientEvent::LeaveChat {
            chat_id: ChatId::new(),
        }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_emit_while_connected_reaches_driver() {
        let (handle, mut rx) = handle_with_state(ConnectionState::Connected);
        let chat_id = ChatId::new();

        assert!(handle.emit(ClientEvent::JoinChat { chat_id }));
        assert_eq!(rx.try_recv().unwrap(), ClientEvent::JoinChat { chat_id });
    }

    #[tokio::test]
    async fn test_state_transition_observed_by_handle() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let handle = ConnectionHandle::new(tx, state_rx);

        assert!(!handle.is_connected());
        state_tx.send(ConnectionState::Connected).unwrap();
        assert!(handle.is_connected());
    }
}
