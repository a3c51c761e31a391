//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → admission.rs (origin/referer, shared-secret token)
//!     → identity.rs (hash client address)
//!     → rate_limit (per-client, per-namespace quota)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Admission runs first: rejected traffic never consumes quota
//! - Fail closed: reject on any security check failure, including store errors
//! - No trust in client input; raw addresses are never stored

pub mod admission;
pub mod identity;
pub mod rate_limit;

pub use admission::{AdmissionError, AdmissionGate};
pub use identity::ClientIdentity;
pub use rate_limit::{Quota, RateDecision, RateLimitError, RateLimitStore};
