//! Client identity resolution.
//!
//! The rate limiter keys on a SHA-256 digest of the client address so raw
//! addresses never reach the record store or the logs.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use std::fmt;
use std::net::SocketAddr;

/// Forwarded-address headers, most trusted first.
pub const FORWARDED_HEADERS: [&str; 3] = ["x-vercel-forwarded-for", "x-forwarded-for", "x-real-ip"];

const UNKNOWN_CLIENT: &str = "unknown";

/// Opaque, one-way-hashed client identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Derive the identity for a request.
    ///
    /// Takes the first comma-separated value of the first forwarded-address
    /// header present, falling back to the TCP peer address.
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let address = client_address(headers)
            .or_else(|| peer.map(|p| p.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
        Self::from_address(&address)
    }

    /// Hash a raw address.
    pub fn from_address(address: &str) -> Self {
        let digest = Sha256::digest(address.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix is enough to correlate log lines.
        write!(f, "{}", &self.0[..12.min(self.0.len())])
    }
}

fn client_address(headers: &HeaderMap) -> Option<String> {
    FORWARDED_HEADERS.iter().find_map(|name| {
        let value = headers.get(*name)?.to_str().ok()?;
        let first = value.split(',').next()?.trim();
        (!first.is_empty()).then(|| first.to_string())
    })
}
