//! Motorsouk Realtime Client
//!
//! Client side of the marketplace chat subsystem: a single WebSocket
//! connection per authenticated session, room membership, typing presence,
//! and fan-out of inbound messages to any number of mounted views.
//!
//! The [`ClientRegistry`] hands out one shared [`ChatClient`] per session;
//! the client reconnects with capped exponential backoff and surfaces its
//! state through a `watch` channel so the UI can render connectivity
//! banners.

pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod events;
pub mod registry;
pub mod rooms;
pub mod typing;

pub use client::{ChatClient, MessageDelivery};
pub use config::{ConfigError, RealtimeConfig};
pub use connection::{ConnectionHandle, ConnectionState};
pub use dispatch::{Dispatcher, Subscription};
pub use events::{ClientEvent, ServerEvent};
pub use registry::ClientRegistry;
pub use rooms::RoomTracker;
pub use typing::{TypingEvent, TypingRegistry, TypingUser};
