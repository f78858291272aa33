//! Status reporting: the append-only, ordered log the user reads.
//!
//! The workflow never reads these back. Sinks must preserve emission order:
//! a user reads the lines as a causal sequence, so reordering is a bug.

use crate::workflow::FailureKind;
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A status log past this size is rotated to `<name>.1` when opened.
pub const STATUS_LOG_ROTATE_BYTES: u64 = 1024 * 1024;

/// How a status line should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Intermediate step of a session ("Sending screenshot...").
    Progress,
    /// Successful outcome or a user-facing notice.
    Info,
    /// Failed outcome.
    Error,
}

/// One immutable status line.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Local>,
    /// Set on `Error` events produced by a workflow step.
    pub kind: Option<FailureKind>,
}

impl StatusEvent {
    pub fn progress(message: impl Into<String>) -> Self {
        Self::new(Severity::Progress, message, None)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message, None)
    }

    pub fn error(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message, Some(kind))
    }

    fn new(severity: Severity, message: impl Into<String>, kind: Option<FailureKind>) -> Self {
        Self {
            severity,
            message: message.into(),
            timestamp: Local::now(),
            kind,
        }
    }

    /// `[HH:MM:SS] message`, the form shown in the log area.
    pub fn render(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }

    /// Mirror the line into the process log at the matching level.
    pub fn log(&self) {
        match self.severity {
            Severity::Progress => log::debug!("[STATUS] {}", self.message),
            Severity::Info => log::info!("[STATUS] {}", self.message),
            Severity::Error => match self.kind {
                Some(kind) => log::warn!("[STATUS] {:?}: {}", kind, self.message),
                None => log::warn!("[STATUS] {}", self.message),
            },
        }
    }
}

/// Where status lines go. Implementations are called from the UI thread
/// (arm/disarm) and from the session worker, so they must be thread-safe
/// and must keep per-caller order.
pub trait StatusSink: Send + Sync {
    fn emit(&self, event: StatusEvent);
}

/// Channel-backed sink: the receiving end is drained by whoever renders.
impl StatusSink for mpsc::Sender<StatusEvent> {
    fn emit(&self, event: StatusEvent) {
        if self.send(event).is_err() {
            log::debug!("[STATUS] Receiver dropped, status line discarded");
        }
    }
}

/// Append-only file copy of the rendered status lines.
///
/// Release builds on Windows have no console, so this file is the durable
/// record of every line, progress included, in emission order.
#[derive(Debug)]
pub struct StatusLog {
    path: PathBuf,
    file: File,
}

impl StatusLog {
    /// Open (or create) the log, rotating it first if it grew too large.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if let Ok(meta) = std::fs::metadata(&path) {
            if meta.len() > STATUS_LOG_ROTATE_BYTES {
                let mut rotated = path.clone().into_os_string();
                rotated.push(".1");
                std::fs::rename(&path, &rotated)?;
                log::info!("[STATUS] Rotated {}", path.display());
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, event: &StatusEvent) -> std::io::Result<()> {
        writeln!(self.file, "{}", event.render())?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_prefixes_wall_clock_time() {
        let event = StatusEvent::info("Capture is now enabled.");
        let line = event.render();
        assert!(line.starts_with('['));
        assert_eq!(&line[9..11], "] ");
        assert!(line.ends_with("Capture is now enabled."));
    }

    #[test]
    fn only_errors_carry_a_kind() {
        assert!(StatusEvent::progress("x").kind.is_none());
        assert!(StatusEvent::info("x").kind.is_none());
        let err = StatusEvent::error(FailureKind::Rejected, "x");
        assert_eq!(err.kind, Some(FailureKind::Rejected));
        assert_eq!(err.severity, Severity::Error);
    }

    #[test]
    fn channel_sink_preserves_order() {
        let (tx, rx) = mpsc::channel();
        for i in 0..5 {
            tx.emit(StatusEvent::progress(format!("step {}", i)));
        }
        drop(tx);
        let messages: Vec<String> = rx.iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["step 0", "step 1", "step 2", "step 3", "step 4"]);
    }

    #[test]
    fn channel_sink_tolerates_dropped_receiver() {
        let (tx, rx) = mpsc::channel::<StatusEvent>();
        drop(rx);
        tx.emit(StatusEvent::info("nobody listening"));
    }

    #[test]
    fn status_log_appends_in_order_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("status.log");

        let mut log = StatusLog::open(&path).unwrap();
        log.append(&StatusEvent::progress("[1] Sending screenshot...")).unwrap();
        log.append(&StatusEvent::error(FailureKind::Unreachable, "[1] Error sending the image."))
            .unwrap();
        drop(log);
        let mut log = StatusLog::open(&path).unwrap();
        log.append(&StatusEvent::info("[2] Stockpile updated")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("] [1] Sending screenshot..."));
        assert!(lines[1].ends_with("] [1] Error sending the image."));
        assert!(lines[2].ends_with("] [2] Stockpile updated"));
    }

    #[test]
    fn oversized_status_log_is_rotated_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.log");
        std::fs::write(&path, vec![b'x'; STATUS_LOG_ROTATE_BYTES as usize + 1]).unwrap();

        let mut log = StatusLog::open(&path).unwrap();
        log.append(&StatusEvent::info("fresh")).unwrap();

        let rotated = dir.path().join("status.log.1");
        assert_eq!(
            std::fs::metadata(&rotated).unwrap().len(),
            STATUS_LOG_ROTATE_BYTES + 1
        );
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.trim_end().ends_with("fresh"));
    }
}
