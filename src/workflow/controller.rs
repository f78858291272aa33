//! Arming, disarming and hotkey dispatch.
//!
//! The controller lives on the UI thread. It never blocks: a hotkey press
//! either claims the Idle phase and drops one trigger into the worker's
//! capacity-1 channel, or it is discarded.

use super::hotkey::{HotkeyId, HotkeyRegistrar};
use super::phase::{PhaseCell, SessionPhase};
use super::worker::Trigger;
use super::FailureKind;
use crate::config::Settings;
use crate::keybind::{Keybind, KeybindError};
use crate::status::{StatusEvent, StatusSink};
use chrono::Local;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

#[derive(Debug, thiserror::Error)]
pub enum ArmError {
    #[error("Capture is disabled until configured. Missing: {}", .fields.join(", "))]
    Incomplete { fields: Vec<&'static str> },

    #[error("Hotkey '{input}' is not valid: {source}")]
    InvalidHotkey {
        input: String,
        #[source]
        source: KeybindError,
    },

    #[error("Hotkey '{hotkey}' could not be registered: {reason}")]
    Registration { hotkey: String, reason: String },
}

impl ArmError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::ConfigurationIncomplete
    }
}

/// What happened to a hotkey press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A new session was handed to the worker.
    Started(u64),
    /// A session is in flight; the press was dropped.
    Busy,
    /// Capture is disarmed.
    NotArmed,
    /// The id is not the currently armed hotkey (e.g. a stale binding).
    UnknownHotkey,
    /// The worker has shut down.
    WorkerStopped,
}

#[derive(Debug, Clone)]
struct ActiveBinding {
    keybind: Keybind,
    id: HotkeyId,
}

pub struct CaptureController<R: HotkeyRegistrar> {
    registrar: R,
    binding: Option<ActiveBinding>,
    settings: Option<Arc<Settings>>,
    phase: Arc<PhaseCell>,
    triggers: mpsc::Sender<Trigger>,
    sink: Arc<dyn StatusSink>,
    sessions_started: u64,
}

impl<R: HotkeyRegistrar> CaptureController<R> {
    pub(crate) fn new(
        registrar: R,
        phase: Arc<PhaseCell>,
        triggers: mpsc::Sender<Trigger>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            registrar,
            binding: None,
            settings: None,
            phase,
            triggers,
            sink,
            sessions_started: 0,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.binding.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.get()
    }

    /// Canonical form of the armed hotkey, if any.
    pub fn hotkey(&self) -> Option<String> {
        self.binding.as_ref().map(|b| b.keybind.to_string())
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    /// Validate `settings` and start listening for its hotkey.
    ///
    /// Re-arming with the same hotkey only refreshes the settings used by
    /// future sessions. A different hotkey replaces the old binding. On any
    /// failure the previous armed state is kept and an error line is emitted.
    pub fn arm(&mut self, settings: Settings) -> Result<(), ArmError> {
        let keybind = match validate(&settings) {
            Ok(keybind) => keybind,
            Err(e) => {
                self.sink
                    .emit(StatusEvent::error(e.kind(), arm_failure_message(&e, &settings)));
                return Err(e);
            }
        };

        if let Some(active) = &self.binding {
            if active.keybind == keybind {
                log::debug!("[HOTKEY] Already armed with {}, settings refreshed", keybind);
                self.settings = Some(Arc::new(settings));
                return Ok(());
            }
        }

        let previous = self.binding.take();
        if let Some(prev) = &previous {
            if let Err(e) = self.registrar.unregister(prev.id) {
                log::warn!("[HOTKEY] Failed to unregister {}: {}", prev.keybind, e);
            }
        }

        match self.registrar.register(&keybind) {
            Ok(id) => {
                log::info!("[HOTKEY] Registered {} ({:?})", keybind, id);
                self.sink.emit(StatusEvent::info(format!(
                    "Capture is now enabled. Press {} to capture.",
                    keybind
                )));
                self.binding = Some(ActiveBinding { keybind, id });
                self.settings = Some(Arc::new(settings));
                Ok(())
            }
            Err(e) => {
                if let Some(prev) = previous {
                    self.restore(prev);
                }
                let err = ArmError::Registration {
                    hotkey: keybind.to_string(),
                    reason: e.to_string(),
                };
                self.sink
                    .emit(StatusEvent::error(err.kind(), arm_failure_message(&err, &settings)));
                Err(err)
            }
        }
    }

    /// Stop listening. Sessions already in flight run to completion.
    pub fn disarm(&mut self) {
        let Some(active) = self.binding.take() else {
            return;
        };
        if let Err(e) = self.registrar.unregister(active.id) {
            log::warn!("[HOTKEY] Failed to unregister {}: {}", active.keybind, e);
        }
        log::info!("[HOTKEY] Unregistered {}", active.keybind);
        self.sink.emit(StatusEvent::info("Capture is disabled."));
    }

    /// Called on the listener's thread for every hotkey press. Never blocks.
    pub fn on_hotkey_event(&mut self, id: HotkeyId) -> Dispatch {
        let Some(active) = &self.binding else {
            return Dispatch::NotArmed;
        };
        if active.id != id {
            log::debug!("[HOTKEY] Ignoring press of unbound id {:?}", id);
            return Dispatch::UnknownHotkey;
        }
        let Some(settings) = self.settings.clone() else {
            return Dispatch::NotArmed;
        };

        if !self.phase.try_begin() {
            log::info!(
                "[HOTKEY] Press dropped, session busy ({:?})",
                self.phase.get()
            );
            return Dispatch::Busy;
        }

        let session = self.sessions_started + 1;
        let trigger = Trigger {
            session,
            triggered_at: Local::now(),
            settings,
        };
        match self.triggers.try_send(trigger) {
            Ok(()) => {
                self.sessions_started = session;
                Dispatch::Started(session)
            }
            Err(TrySendError::Full(_)) => {
                log::warn!("[HOTKEY] Trigger slot occupied, press dropped");
                self.phase.finish();
                Dispatch::Busy
            }
            Err(TrySendError::Closed(_)) => {
                log::error!("[HOTKEY] Session worker has stopped");
                self.phase.finish();
                Dispatch::WorkerStopped
            }
        }
    }

    fn restore(&mut self, prev: ActiveBinding) {
        match self.registrar.register(&prev.keybind) {
            Ok(id) => {
                log::info!("[HOTKEY] Restored previous binding {}", prev.keybind);
                self.binding = Some(ActiveBinding {
                    keybind: prev.keybind,
                    id,
                });
            }
            Err(e) => {
                log::error!(
                    "[HOTKEY] Could not restore {} after failed re-arm: {}",
                    prev.keybind,
                    e
                );
                self.sink.emit(StatusEvent::info("Capture is disabled."));
            }
        }
    }
}

fn validate(settings: &Settings) -> Result<Keybind, ArmError> {
    let mut missing = Vec::new();
    if settings.hotkey().is_none() {
        missing.push("keybind.key");
    }
    if settings.url().is_none() {
        missing.push("server.url");
    }
    if settings.token().is_none() {
        missing.push("server.token");
    }
    if !missing.is_empty() {
        return Err(ArmError::Incomplete { fields: missing });
    }

    let input = settings.hotkey().unwrap_or_default();
    Keybind::parse(input).map_err(|source| ArmError::InvalidHotkey {
        input: input.to_string(),
        source,
    })
}

fn arm_failure_message(err: &ArmError, settings: &Settings) -> String {
    match err {
        ArmError::Incomplete { fields } if fields.contains(&"server.token") => {
            match settings.token_page_url() {
                Some(page) => format!("{}. Get a token at {}.", err, page),
                None => format!("{}.", err),
            }
        }
        _ => format!("{}.", err),
    }
}
