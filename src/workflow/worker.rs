//! The session worker: locate → capture → submit, one session at a time.
//!
//! Runs as a single tokio task. Window lookup and capture are blocking OS
//! calls, so they go through `spawn_blocking`; the listener thread is never
//! involved after it hands over the trigger.

use super::phase::{IdleOnDrop, PhaseCell, SessionPhase};
use super::WorkflowError;
use crate::capture::{CaptureError, ScreenshotCapturer};
use crate::config::Settings;
use crate::status::{StatusEvent, StatusSink};
use crate::submit::{SubmissionResult, Submitter};
use crate::window::{LocateError, WindowInfo, WindowLocator};
use chrono::{DateTime, Local};
use image::DynamicImage;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One hotkey press that claimed the Idle phase.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub session: u64,
    pub triggered_at: DateTime<Local>,
    /// Snapshot taken when the press was accepted. Later edits don't apply.
    pub settings: Arc<Settings>,
}

/// Working state of a single session. Owned by the worker, discarded once
/// the outcome has been reported.
struct CaptureSession {
    id: u64,
    triggered_at: DateTime<Local>,
    settings: Arc<Settings>,
    window: Option<WindowInfo>,
    image: Option<DynamicImage>,
    result: Option<SubmissionResult>,
}

impl CaptureSession {
    fn new(trigger: Trigger) -> Self {
        Self {
            id: trigger.session,
            triggered_at: trigger.triggered_at,
            settings: trigger.settings,
            window: None,
            image: None,
            result: None,
        }
    }
}

pub struct SessionWorker<L, C, S> {
    locator: Arc<L>,
    capturer: Arc<C>,
    submitter: S,
    sink: Arc<dyn StatusSink>,
    phase: Arc<PhaseCell>,
    triggers: mpsc::Receiver<Trigger>,
}

impl<L, C, S> SessionWorker<L, C, S>
where
    L: WindowLocator + 'static,
    C: ScreenshotCapturer + 'static,
    S: Submitter,
{
    pub(crate) fn new(
        locator: L,
        capturer: C,
        submitter: S,
        sink: Arc<dyn StatusSink>,
        phase: Arc<PhaseCell>,
        triggers: mpsc::Receiver<Trigger>,
    ) -> Self {
        Self {
            locator: Arc::new(locator),
            capturer: Arc::new(capturer),
            submitter,
            sink,
            phase,
            triggers,
        }
    }

    /// Process triggers until the controller is dropped.
    pub async fn run(mut self) {
        log::info!("[WORKFLOW] Session worker ready");
        while let Some(trigger) = self.triggers.recv().await {
            let _idle = IdleOnDrop(&self.phase);
            self.run_session(trigger).await;
        }
        log::info!("[WORKFLOW] Session worker stopped");
    }

    async fn run_session(&self, trigger: Trigger) {
        let mut session = CaptureSession::new(trigger);
        let start = std::time::Instant::now();
        log::info!(
            "[WORKFLOW] Session {} triggered at {}",
            session.id,
            session.triggered_at.format("%H:%M:%S%.3f")
        );

        let outcome = self.drive(&mut session).await;
        let event = match outcome {
            Ok(()) => {
                let summary = session
                    .result
                    .as_ref()
                    .map(|r| r.summary.as_str())
                    .unwrap_or("Screenshot accepted");
                StatusEvent::info(format!("[{}] {}", session.id, summary))
            }
            Err(e) => StatusEvent::error(
                e.kind(),
                format!("[{}] {}", session.id, describe(&e, &session.settings)),
            ),
        };
        self.sink.emit(event);

        log::info!(
            "[WORKFLOW] Session {} finished in {}ms (window: {}, status: {})",
            session.id,
            start.elapsed().as_millis(),
            session
                .window
                .as_ref()
                .map(|w| w.handle.to_string())
                .unwrap_or_else(|| "-".to_string()),
            session
                .result
                .as_ref()
                .map(|r| r.status.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    async fn drive(&self, session: &mut CaptureSession) -> Result<(), WorkflowError> {
        // Locating
        let title = session.settings.window.title.clone();
        self.progress(session.id, format!("Looking for window '{}'...", title));
        let locator = Arc::clone(&self.locator);
        let window = tokio::task::spawn_blocking(move || {
            let window = locator.find(&title)?;
            if !locator.focus(window.handle) {
                log::debug!(
                    "[WORKFLOW] Focus request for {} failed, capturing as-is",
                    window.handle
                );
            }
            Ok::<_, LocateError>(window)
        })
        .await
        .map_err(|e| LocateError::Enumeration(format!("window lookup panicked: {}", e)))??;
        log::info!("[WORKFLOW] Found '{}' ({})", window.title, window.handle);
        let handle = window.handle;
        session.window = Some(window);

        // Capturing
        self.phase.advance(SessionPhase::Capturing);
        self.progress(session.id, "Capturing screenshot...");
        let capturer = Arc::clone(&self.capturer);
        let image = tokio::task::spawn_blocking(move || capturer.capture(handle))
            .await
            .map_err(|e| CaptureError::Backend(format!("capture panicked: {}", e)))??;
        session.image = Some(image);

        // Submitting
        self.phase.advance(SessionPhase::Submitting);
        self.progress(session.id, "Sending screenshot...");
        let image = match session.image.take() {
            Some(image) => image,
            None => return Err(CaptureError::Backend("image buffer missing".to_string()).into()),
        };
        let result = self.submitter.submit(image, &session.settings).await?;
        session.result = Some(result);
        Ok(())
    }

    fn progress(&self, session: u64, message: impl AsRef<str>) {
        self.sink
            .emit(StatusEvent::progress(format!("[{}] {}", session, message.as_ref())));
    }
}

fn describe(err: &WorkflowError, settings: &Settings) -> String {
    match err {
        WorkflowError::Locate(LocateError::NotFound(title)) => {
            format!("No window titled '{}' found. Is Foxhole running?", title)
        }
        WorkflowError::Locate(e) => e.to_string(),
        WorkflowError::Capture(e) => format!("Screenshot failed: {}", e),
        WorkflowError::Submit(e) => match e.kind() {
            super::FailureKind::ConfigurationIncomplete => match settings.token_page_url() {
                Some(page) => format!("Error sending the image. {}. Get a token at {}.", e, page),
                None => format!("Error sending the image. {}.", e),
            },
            _ => format!("Error sending the image. {}", e),
        },
    }
}
