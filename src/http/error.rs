//! Mapping of gateway failures to HTTP responses.
//!
//! Bodies are always `{"error": "..."}`. Admission failures never reveal
//! which check failed.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::security::admission::AdmissionError;
use crate::security::rate_limit::{ceil_secs, RateLimitError};
use crate::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Admission(AdmissionError),

    #[error("rate limit exceeded for {namespace}")]
    RateLimited {
        namespace: &'static str,
        reset_after: Duration,
    },

    #[error(transparent)]
    RateLimitStore(RateLimitError),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The parser found no section headings in the model output.
    #[error("model output contained no recognizable sections")]
    UnparseableBrief,

    #[error("brief is missing required sections: {}", .0.join(", "))]
    IncompleteBrief(Vec<String>),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Admission(e) if e.is_origin_failure() => StatusCode::FORBIDDEN,
            ApiError::Admission(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::RateLimitStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(UpstreamError::NotConfigured) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(UpstreamError::EmptyResponse) => StatusCode::BAD_GATEWAY,
            ApiError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::UnparseableBrief | ApiError::IncompleteBrief(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Admission(e) if e.is_origin_failure() => "Forbidden".into(),
            ApiError::Admission(_) => "Unauthorized".into(),
            ApiError::RateLimited { reset_after, .. } => {
                format!("Rate limit reached. Resets in {}.", describe_wait(*reset_after))
            }
            ApiError::RateLimitStore(_) => "Service temporarily unavailable".into(),
            ApiError::InvalidInput(msg) => msg.clone(),
            ApiError::Upstream(UpstreamError::NotConfigured) => "API configuration error".into(),
            ApiError::Upstream(UpstreamError::EmptyResponse) => "No response from AI".into(),
            ApiError::Upstream(_) => "AI service unavailable".into(),
            ApiError::UnparseableBrief | ApiError::IncompleteBrief(_) => "Brief validation failed".into(),
        }
    }
}

/// "3 hours", "1 hour", "12 minutes".
fn describe_wait(d: Duration) -> String {
    let secs = ceil_secs(d);
    if secs >= 3600 {
        let hours = secs.div_ceil(3600);
        format!("{} hour{}", hours, if hours == 1 { "" } else { "s" })
    } else {
        let minutes = secs.div_ceil(60).max(1);
        format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(json!({ "error": self.public_message() }))).into_response();

        if let ApiError::RateLimited { reset_after, .. } = &self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(ceil_secs(*reset_after)));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_statuses() {
        assert_eq!(ApiError::Admission(AdmissionError::OriginRejected).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Admission(AdmissionError::RefererRejected).status(), StatusCode::FORBIDDEN);
        for e in [
            AdmissionError::TokenMissing,
            AdmissionError::SecretNotConfigured,
            AdmissionError::TokenLengthMismatch,
            AdmissionError::TokenMismatch,
        ] {
            let err = ApiError::Admission(e);
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.public_message(), "Unauthorized");
        }
    }

    #[test]
    fn test_rate_limited_response() {
        let response = ApiError::RateLimited {
            namespace: "brief",
            reset_after: Duration::from_secs(2 * 3600 + 1),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "7201");
    }

    #[test]
    fn test_describe_wait() {
        assert_eq!(describe_wait(Duration::from_secs(2 * 3600 + 1)), "3 hours");
        assert_eq!(describe_wait(Duration::from_secs(3600)), "1 hour");
        assert_eq!(describe_wait(Duration::from_secs(90)), "2 minutes");
        assert_eq!(describe_wait(Duration::from_millis(10)), "1 minute");
    }

    #[test]
    fn test_store_failure_is_unavailable() {
        let err = ApiError::RateLimitStore(RateLimitError::StoreTimeout(Duration::from_millis(500)));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_bad_model_output_is_bad_gateway() {
        assert_eq!(ApiError::UnparseableBrief.status(), StatusCode::BAD_GATEWAY);
        let err = ApiError::IncompleteBrief(vec!["TRADEOFFS".into()]);
        assert_eq!(err.to_string(), "brief is missing required sections: TRADEOFFS");
    }
}
