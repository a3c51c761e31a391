//! Decision brief gateway library.
//!
//! Fronts an LLM chat completions API with an admission gate, per-client
//! rate limiting, and a structural parser that turns model output into
//! brief sections.

pub mod brief;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
