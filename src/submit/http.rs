//! HTTPS submission via reqwest.
//!
//! POST <server.url>, `Authorization: Bearer <token>`, multipart field
//! `image` holding `screenshot.png`. The overall timeout is generous because
//! the server runs OCR before it answers.

use super::{summarize, SubmissionResult, SubmitError, Submitter};
use crate::capture::{encode_png, EncodeError};
use crate::config::Settings;
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpSubmitter {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpSubmitter {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Client whose requests give up after `timeout` without a full response.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .user_agent(concat!("stockpile-capture/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn transport_error(&self, e: reqwest::Error) -> SubmitError {
        if e.is_builder() {
            return SubmitError::InvalidRequest(e.to_string());
        }
        let detail = if e.is_timeout() {
            format!("no response within {}s", self.timeout.as_secs_f64())
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else {
            e.to_string()
        };
        SubmitError::Unreachable {
            status: None,
            detail,
        }
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(
        &self,
        image: DynamicImage,
        settings: &Settings,
    ) -> Result<SubmissionResult, SubmitError> {
        let url = settings.url().ok_or(SubmitError::MissingSetting("server.url"))?;
        let token = settings
            .token()
            .ok_or(SubmitError::MissingSetting("server.token"))?;
        if url.starts_with("http://") {
            log::warn!("[SUBMIT] {} is not HTTPS, token is sent in clear text", url);
        }

        let start = std::time::Instant::now();
        let png_bytes = tokio::task::spawn_blocking(move || encode_png(&image))
            .await
            .map_err(|e| EncodeError::EncodingFailed(e.to_string()))??;
        log::info!(
            "[SUBMIT] PNG encode: {}ms ({} bytes)",
            start.elapsed().as_millis(),
            png_bytes.len()
        );

        let part = Part::bytes(png_bytes)
            .file_name("screenshot.png")
            .mime_str("image/png")
            .map_err(|e| SubmitError::InvalidRequest(e.to_string()))?;
        let form = Form::new().part("image", part);

        let mut request = self
            .client
            .post(url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .multipart(form);
        if let Some((header, value)) = settings.webhook_header() {
            request = request.header(header, value);
        }

        let send_start = std::time::Instant::now();
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        log::info!(
            "[SUBMIT] {} answered {} in {}ms",
            url,
            status,
            send_start.elapsed().as_millis()
        );

        let summary = summarize(&body);
        if status.is_success() {
            return Ok(SubmissionResult {
                status: status.as_u16(),
                summary: summary.unwrap_or_else(|| "Screenshot accepted".to_string()),
                body,
            });
        }

        let detail = summary.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("no details")
                .to_string()
        });
        if status.is_client_error() {
            Err(SubmitError::Rejected {
                status: status.as_u16(),
                detail,
            })
        } else {
            Err(SubmitError::Unreachable {
                status: Some(status.as_u16()),
                detail,
            })
        }
    }
}
