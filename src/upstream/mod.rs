//! Upstream model API.
//!
//! # Data Flow
//! ```text
//! Validated request
//!     → prompt.rs (system prompt + conversation)
//!     → client.rs (POST chat/completions, bounded by timeout)
//!     → raw text blob handed to the brief parser unmodified
//! ```

pub mod client;
pub mod prompt;
pub mod types;

pub use client::{ModelClient, OpenRouterClient};
pub use types::{ChatMessage, ChatRole, Lens, UpstreamError, UpstreamResult};
