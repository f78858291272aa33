//! The session phase: the only state shared between the UI thread and the
//! worker.
//!
//! Single writer per edge: the dispatcher moves Idle → Locating with a
//! compare-and-set, the worker owns every later transition and the return
//! to Idle. A failed CAS means a session is in flight and the press is
//! dropped.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionPhase {
    Idle = 0,
    Locating = 1,
    Capturing = 2,
    Submitting = 3,
}

impl SessionPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionPhase::Locating,
            2 => SessionPhase::Capturing,
            3 => SessionPhase::Submitting,
            _ => SessionPhase::Idle,
        }
    }
}

#[derive(Debug)]
pub struct PhaseCell(AtomicU8);

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(SessionPhase::Idle as u8))
    }

    pub fn get(&self) -> SessionPhase {
        SessionPhase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Idle → Locating. Returns false when a session is already in flight.
    pub fn try_begin(&self) -> bool {
        self.0
            .compare_exchange(
                SessionPhase::Idle as u8,
                SessionPhase::Locating as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn advance(&self, to: SessionPhase) {
        let from = self.0.swap(to as u8, Ordering::AcqRel);
        log::debug!(
            "[WORKFLOW] Phase {:?} -> {:?}",
            SessionPhase::from_u8(from),
            to
        );
    }

    pub(crate) fn finish(&self) {
        self.advance(SessionPhase::Idle);
    }
}

/// Returns the phase to Idle when dropped, whatever way the session ends.
pub(crate) struct IdleOnDrop<'a>(pub(crate) &'a PhaseCell);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}
