//! Admission gate: first-party origin and shared-secret checks.
//!
//! Runs before the rate limiter so rejected traffic never consumes quota.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::AdmissionConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;

/// Why a request was refused admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("origin not allowed")]
    OriginRejected,

    #[error("referer not allowed")]
    RefererRejected,

    #[error("missing app token")]
    TokenMissing,

    #[error("shared secret not configured")]
    SecretNotConfigured,

    #[error("app token length mismatch")]
    TokenLengthMismatch,

    #[error("invalid app token")]
    TokenMismatch,
}

impl AdmissionError {
    /// Origin-class failures are forbidden; everything else is unauthorized.
    pub fn is_origin_failure(&self) -> bool {
        matches!(self, Self::OriginRejected | Self::RefererRejected)
    }

    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::OriginRejected => "origin",
            Self::RefererRejected => "referer",
            Self::TokenMissing => "token_missing",
            Self::SecretNotConfigured => "secret_not_configured",
            Self::TokenLengthMismatch => "token_length",
            Self::TokenMismatch => "token_mismatch",
        }
    }
}

/// Validates that a request comes from the first-party application.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    app_url: String,
    token_header: String,
    secret: Option<Vec<u8>>,
}

impl AdmissionGate {
    pub fn new(app_url: impl Into<String>, token_header: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            app_url: app_url.into(),
            token_header: token_header.into().to_ascii_lowercase(),
            secret: secret.filter(|s| !s.is_empty()).map(String::into_bytes),
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(
            config.app_url.clone(),
            config.token_header.clone(),
            config.shared_secret.clone(),
        )
    }

    /// `Origin` must equal the app URL exactly; `Referer` must start with it.
    /// A request carrying neither passes.
    pub fn check_origin(&self, headers: &HeaderMap) -> Result<(), AdmissionError> {
        if let Some(origin) = headers.get(header::ORIGIN) {
            if origin.as_bytes() != self.app_url.as_bytes() {
                return Err(AdmissionError::OriginRejected);
            }
        }

        if let Some(referer) = headers.get(header::REFERER) {
            if !referer.as_bytes().starts_with(self.app_url.as_bytes()) {
                return Err(AdmissionError::RefererRejected);
            }
        }

        Ok(())
    }

    /// Compare the token header against the shared secret in constant time.
    pub fn check_token(&self, headers: &HeaderMap) -> Result<(), AdmissionError> {
        let provided = headers
            .get(self.token_header.as_str())
            .map(|v| v.as_bytes())
            .filter(|v| !v.is_empty())
            .ok_or(AdmissionError::TokenMissing)?;

        let expected = self
            .secret
            .as_deref()
            .ok_or(AdmissionError::SecretNotConfigured)?;

        match constant_time_compare(provided, expected) {
            TokenComparison::Equal => Ok(()),
            TokenComparison::LengthMismatch => Err(AdmissionError::TokenLengthMismatch),
            TokenComparison::ContentMismatch => Err(AdmissionError::TokenMismatch),
        }
    }

    /// Origin check, then token check.
    pub fn admit(&self, headers: &HeaderMap) -> Result<(), AdmissionError> {
        self.check_origin(headers)?;
        self.check_token(headers)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum TokenComparison {
    Equal,
    LengthMismatch,
    ContentMismatch,
}

// Both sides are padded to the same length so the byte comparison takes the
// same time wherever the inputs first differ, including on length mismatch.
fn constant_time_compare(provided: &[u8], expected: &[u8]) -> TokenComparison {
    let max_len = provided.len().max(expected.len()).max(1);
    let mut provided_padded = vec![0u8; max_len];
    let mut expected_padded = vec![0u8; max_len];
    provided_padded[..provided.len()].copy_from_slice(provided);
    expected_padded[..expected.len()].copy_from_slice(expected);

    let content_eq: bool = provided_padded.ct_eq(&expected_padded).into();
    let len_eq = provided.len() == expected.len();

    match (len_eq, content_eq) {
        (true, true) => TokenComparison::Equal,
        (false, _) => TokenComparison::LengthMismatch,
        (true, false) => TokenComparison::ContentMismatch,
    }
}

/// Middleware enforcing the admission gate.
pub async fn admission_middleware(
    State(gate): State<Arc<AdmissionGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match gate.admit(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            if e == AdmissionError::SecretNotConfigured {
                tracing::error!("Shared secret is not configured; rejecting all gated requests");
            } else {
                tracing::warn!(reason = e.reason(), path = %request.uri().path(), "Admission rejected");
            }
            metrics::record_admission_rejected(e.reason());
            ApiError::Admission(e).into_response()
        }
    }
}
