//! Realtime connectivity probe for motorsouk
//!
//! Connects to the chat endpoint with a real access token and prints
//! inbound deliveries until Ctrl-C. Useful for checking a deployment's
//! socket endpoint and auth flow without booting the whole web client.
//!
//! Usage:
//!   cargo run --bin chat-probe -- <access-token> [chat-id]
//!
//! Environment:
//!   API_BASE_URL   API base the socket endpoint is derived from

use std::env;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use motorsouk_guard::session_from_token;
use motorsouk_realtime::{ConnectionState, RealtimeConfig};
use motorsouk_shared::ChatId;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(token) = env::args().nth(1) else {
        bail!("Usage: chat-probe <access-token> [chat-id]");
    };
    let chat_id = match env::args().nth(2) {
        Some(raw) => Some(ChatId(
            Uuid::parse_str(&raw).context("chat-id must be a UUID")?,
        )),
        None => None,
    };

    let session = session_from_token(&token)?
        .context("Access token is expired; log in again and retry")?;
    let config = RealtimeConfig::from_env()?;
    tracing::info!(endpoint = %config.endpoint, user_id = %session.user_id(), "Probing");

    let registry = motorsouk_realtime::ClientRegistry::new(config);
    let client = registry.acquire(session).await;

    let mut state = client.watch_state();
    let mut messages = client.subscribe_messages().await;
    let mut typing = client.subscribe_typing().await;

    // The driver may have connected before we started watching
    if client.is_connected() {
        if let Some(chat_id) = chat_id {
            client.join_chat(chat_id, None).await;
            println!("joined chat {}", chat_id);
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted; shutting down");
                client.shutdown();
                return Ok(());
            }
            changed = state.changed() => {
                if changed.is_err() {
                    bail!("Connection driver exited");
                }
                let current = *state.borrow_and_update();
                println!("state: {:?}", current);
                if current == ConnectionState::Connected {
                    if let Some(chat_id) = chat_id {
                        client.join_chat(chat_id, None).await;
                        println!("joined chat {}", chat_id);
                    }
                }
            }
            delivery = messages.recv() => {
                let Some(delivery) = delivery else { bail!("Message stream closed") };
                println!(
                    "[{}] {}: {}",
                    delivery.chat_id,
                    delivery.message.sender_name.as_deref().unwrap_or("unknown"),
                    delivery.message.content
                );
            }
            event = typing.recv() => {
                let Some(event) = event else { bail!("Typing stream closed") };
                let verb = if event.started { "started" } else { "stopped" };
                println!(
                    "[{}] {} {} typing",
                    event.chat_id, event.user.first_name, verb
                );
            }
        }
    }
}
