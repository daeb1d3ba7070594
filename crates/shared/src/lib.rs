//! Motorsouk Shared Types
//!
//! Types shared across the motorsouk client: user identity, sessions,
//! chat message payloads, and the umbrella error type.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
