//! Capture workflow: the hotkey-driven locate → capture → submit state machine.
//!
//! Two halves share one `PhaseCell`:
//!   - `CaptureController` (UI thread): arm/disarm, hotkey dispatch
//!   - `SessionWorker` (tokio task): runs sessions, reports status
//!
//! States: Idle → Locating → Capturing → Submitting → Idle. Presses that
//! arrive outside Idle are dropped, so at most one session is ever in flight.

mod controller;
mod hotkey;
mod phase;
mod worker;

pub use controller::{ArmError, CaptureController, Dispatch};
pub use hotkey::{HotkeyId, HotkeyRegistrar, RegistrarError};
pub use phase::{PhaseCell, SessionPhase};
pub use worker::{SessionWorker, Trigger};

use crate::capture::{CaptureError, ScreenshotCapturer};
use crate::status::StatusSink;
use crate::submit::{SubmitError, Submitter};
use crate::window::{LocateError, WindowLocator};
use std::sync::Arc;
use tokio::sync::mpsc;

/// User-facing failure categories. Every one is recoverable; none is fatal
/// to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Missing or malformed hotkey, URL or token.
    ConfigurationIncomplete,
    /// Target application not running or not visible.
    WindowNotFound,
    /// Stale handle, minimized window or empty region.
    CaptureFailed,
    /// 4xx from the server, usually a bad token.
    Rejected,
    /// Network failure, timeout or 5xx.
    Unreachable,
}

/// Failure of a single session step.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl WorkflowError {
    pub fn kind(&self) -> FailureKind {
        match self {
            WorkflowError::Locate(_) => FailureKind::WindowNotFound,
            WorkflowError::Capture(_) => FailureKind::CaptureFailed,
            WorkflowError::Submit(e) => e.kind(),
        }
    }
}

/// Wire a controller to its worker through a capacity-1 trigger channel.
///
/// Spawn `worker.run()` on a tokio runtime; keep the controller on the
/// thread that owns the hotkey hook. Dropping the controller stops the
/// worker once its current session ends.
pub fn pipeline<R, L, C, S>(
    registrar: R,
    locator: L,
    capturer: C,
    submitter: S,
    sink: Arc<dyn StatusSink>,
) -> (CaptureController<R>, SessionWorker<L, C, S>)
where
    R: HotkeyRegistrar,
    L: WindowLocator + 'static,
    C: ScreenshotCapturer + 'static,
    S: Submitter,
{
    let (tx, rx) = mpsc::channel(1);
    let phase = Arc::new(PhaseCell::new());
    let controller = CaptureController::new(registrar, Arc::clone(&phase), tx, Arc::clone(&sink));
    let worker = SessionWorker::new(locator, capturer, submitter, sink, phase, rx);
    (controller, worker)
}
