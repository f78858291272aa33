//! Submission domain: upload a capture to the processing server.
//!
//! No retry or backoff lives here: every failure is surfaced immediately
//! and the user re-presses the hotkey if they want another attempt.

mod http;

pub use http::{HttpSubmitter, CONNECT_TIMEOUT, DEFAULT_TIMEOUT};

use crate::capture::EncodeError;
use crate::config::Settings;
use crate::workflow::FailureKind;
use async_trait::async_trait;
use image::DynamicImage;

/// A 2xx response from the server.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub status: u16,
    /// Text shown to the user: the JSON `message` field, else the raw body.
    pub summary: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Server rejected the screenshot (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Request could not be built: {0}")]
    InvalidRequest(String),

    #[error("Server unreachable: {detail}")]
    Unreachable { status: Option<u16>, detail: String },

    #[error("Could not encode screenshot: {0}")]
    Encode(#[from] EncodeError),

    #[error("{0} is not configured")]
    MissingSetting(&'static str),
}

impl SubmitError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SubmitError::Rejected { .. } | SubmitError::InvalidRequest(_) => FailureKind::Rejected,
            SubmitError::Unreachable { .. } => FailureKind::Unreachable,
            SubmitError::Encode(_) => FailureKind::CaptureFailed,
            SubmitError::MissingSetting(_) => FailureKind::ConfigurationIncomplete,
        }
    }
}

#[async_trait]
pub trait Submitter: Send + Sync {
    /// Encode `image` and POST it to `settings.server.url` with the bearer token.
    async fn submit(
        &self,
        image: DynamicImage,
        settings: &Settings,
    ) -> Result<SubmissionResult, SubmitError>;
}

/// Pull the human-readable part out of a response body.
///
/// JSON objects with a string `message` field yield that field; anything
/// else yields the trimmed body. Blank bodies yield `None`.
pub fn summarize(body: &str) -> Option<String> {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = map.get("message").and_then(|m| m.as_str()) {
            let message = message.trim();
            if !message.is_empty() {
                return Some(message.to_string());
            }
        }
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_message_field_is_preferred() {
        let body = r#"{"message": "Stockpile 'Seaport' updated: 42 items", "id": 7}"#;
        assert_eq!(
            summarize(body).as_deref(),
            Some("Stockpile 'Seaport' updated: 42 items")
        );
    }

    #[test]
    fn json_without_message_falls_back_to_body() {
        let body = r#"{"id": 7}"#;
        assert_eq!(summarize(body).as_deref(), Some(body));
    }

    #[test]
    fn plain_text_is_trimmed() {
        assert_eq!(summarize("  ok\n").as_deref(), Some("ok"));
    }

    #[test]
    fn blank_body_has_no_summary() {
        assert_eq!(summarize(" \n"), None);
    }

    #[test]
    fn error_kinds_follow_taxonomy() {
        let rejected = SubmitError::Rejected {
            status: 401,
            detail: "bad token".into(),
        };
        assert_eq!(rejected.kind(), FailureKind::Rejected);
        let down = SubmitError::Unreachable {
            status: Some(503),
            detail: "maintenance".into(),
        };
        assert_eq!(down.kind(), FailureKind::Unreachable);
        assert_eq!(
            SubmitError::MissingSetting("server.token").kind(),
            FailureKind::ConfigurationIncomplete
        );
    }
}
