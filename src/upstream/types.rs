//! Upstream chat types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Perspective the brief is written from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lens {
    #[default]
    Product,
    Revenue,
    Ops,
    Customer,
    Risk,
}

impl fmt::Display for Lens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lens::Product => "Product",
            Lens::Revenue => "Revenue",
            Lens::Ops => "Ops",
            Lens::Customer => "Customer",
            Lens::Risk => "Risk",
        };
        f.write_str(name)
    }
}

/// Chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One chat completion message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Errors that can occur calling the model API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No API key configured.
    #[error("upstream API key not configured")]
    NotConfigured,

    /// Transport failure or timeout.
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// Response had no message content.
    #[error("upstream returned no content")]
    EmptyResponse,
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lens_wire_names() {
        let lens: Lens = serde_json::from_str("\"Revenue\"").unwrap();
        assert_eq!(lens, Lens::Revenue);
        assert!(serde_json::from_str::<Lens>("\"Marketing\"").is_err());
        assert_eq!(Lens::default(), Lens::Product);
        assert_eq!(Lens::Ops.to_string(), "Ops");
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }
}
