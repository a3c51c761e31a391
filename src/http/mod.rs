//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout, body limit)
//!     → security::admission (origin/referer, shared secret)
//!     → security::rate_limit (namespace quota per client)
//!     → handlers.rs (validate input, call model, parse brief)
//!     → error.rs (map failures to status + JSON body)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer};
