//! Shared fakes for the workflow and submission integration tests.
//!
//! Each fake keeps its observable state behind an `Arc` so a test can hand
//! the fake to `workflow::pipeline` and still inspect it afterwards.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, RgbaImage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Condvar, Mutex};
use std::time::Duration;
use stockpile_capture_lib::capture::{CaptureError, ScreenshotCapturer};
use stockpile_capture_lib::config::Settings;
use stockpile_capture_lib::keybind::Keybind;
use stockpile_capture_lib::status::{Severity, StatusEvent};
use stockpile_capture_lib::submit::{SubmissionResult, SubmitError, Submitter};
use stockpile_capture_lib::window::{LocateError, WindowHandle, WindowInfo, WindowLocator};
use stockpile_capture_lib::workflow::{
    CaptureController, HotkeyId, HotkeyRegistrar, RegistrarError, SessionPhase,
};

// ── Settings ─────────────────────────────────────────────────────────

/// Complete settings pointing at `url`.
pub fn settings_for(url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.keybind.key = Some("F9".to_string());
    settings.server.url = url.to_string();
    settings.server.token = Some("abc".to_string());
    settings
}

pub fn settings() -> Settings {
    settings_for("https://example.test/scan")
}

// ── Hotkey registrar ─────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RegistrarState {
    pub registered: HashMap<u32, Keybind>,
    pub unregistered: Vec<u32>,
    /// Keybinds whose registration should fail (already taken by the OS).
    pub refuse: Vec<String>,
    next_id: u32,
}

#[derive(Debug, Clone, Default)]
pub struct FakeRegistrar {
    pub state: Arc<Mutex<RegistrarState>>,
}

impl FakeRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, hotkey: &str) {
        let keybind = Keybind::parse(hotkey).unwrap();
        self.state.lock().unwrap().refuse.push(keybind.to_string());
    }

    /// Id currently registered for `hotkey`, if any.
    pub fn id_for(&self, hotkey: &str) -> Option<HotkeyId> {
        let keybind = Keybind::parse(hotkey).unwrap();
        let state = self.state.lock().unwrap();
        state
            .registered
            .iter()
            .find(|(_, kb)| **kb == keybind)
            .map(|(id, _)| HotkeyId(*id))
    }

    pub fn registered_count(&self) -> usize {
        self.state.lock().unwrap().registered.len()
    }
}

impl HotkeyRegistrar for FakeRegistrar {
    fn register(&mut self, keybind: &Keybind) -> Result<HotkeyId, RegistrarError> {
        let mut state = self.state.lock().unwrap();
        if state.refuse.contains(&keybind.to_string()) {
            return Err(RegistrarError(format!("{} is already in use", keybind)));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.registered.insert(id, keybind.clone());
        Ok(HotkeyId(id))
    }

    fn unregister(&mut self, id: HotkeyId) -> Result<(), RegistrarError> {
        let mut state = self.state.lock().unwrap();
        state.registered.remove(&id.0);
        state.unregistered.push(id.0);
        Ok(())
    }
}

// ── Window locator ───────────────────────────────────────────────────

/// Blocks window enumeration until opened, so a test can hold a session
/// in the Locating phase.
#[derive(Debug, Default)]
pub struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub fn closed() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeLocator {
    pub windows: Vec<WindowInfo>,
    pub gate: Option<Arc<Gate>>,
    pub calls: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    pub max_active: Arc<AtomicUsize>,
    /// When set, every foreground request fails.
    pub refuse_focus: bool,
    pub focus_calls: Arc<AtomicUsize>,
}

impl FakeLocator {
    pub fn with_titles(titles: &[&str]) -> Self {
        let windows = titles
            .iter()
            .enumerate()
            .map(|(i, title)| WindowInfo {
                handle: WindowHandle(0x100 + i as u32),
                title: title.to_string(),
                is_focused: false,
                is_minimized: false,
            })
            .collect();
        Self {
            windows,
            ..Self::default()
        }
    }

    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn refusing_focus(mut self) -> Self {
        self.refuse_focus = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn focus_calls(&self) -> usize {
        self.focus_calls.load(Ordering::SeqCst)
    }
}

impl WindowLocator for FakeLocator {
    fn list(&self) -> Result<Vec<WindowInfo>, LocateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(self.windows.clone())
    }

    fn focus(&self, _handle: WindowHandle) -> bool {
        self.focus_calls.fetch_add(1, Ordering::SeqCst);
        !self.refuse_focus
    }
}

// ── Capturer ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum FakeCapturer {
    Image { width: u32, height: u32 },
    Stale,
}

impl FakeCapturer {
    pub fn ok() -> Self {
        FakeCapturer::Image {
            width: 32,
            height: 24,
        }
    }
}

impl ScreenshotCapturer for FakeCapturer {
    fn capture(&self, handle: WindowHandle) -> Result<DynamicImage, CaptureError> {
        match *self {
            FakeCapturer::Image { width, height } => {
                stockpile_capture_lib::capture::ensure_non_empty(DynamicImage::ImageRgba8(
                    RgbaImage::new(width, height),
                ))
            }
            FakeCapturer::Stale => Err(CaptureError::StaleHandle(handle)),
        }
    }
}

// ── Submitter ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FakeSubmitter {
    pub reply: Option<u16>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeSubmitter {
    /// Accepts every screenshot with "Stockpile updated".
    pub fn accepting() -> Self {
        Self {
            reply: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fails every submission with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Some(status),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Submitter for FakeSubmitter {
    async fn submit(
        &self,
        _image: DynamicImage,
        _settings: &Settings,
    ) -> Result<SubmissionResult, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            None => Ok(SubmissionResult {
                status: 200,
                summary: "Stockpile updated".to_string(),
                body: r#"{"message":"Stockpile updated"}"#.to_string(),
            }),
            Some(status) if (400..500).contains(&status) => Err(SubmitError::Rejected {
                status,
                detail: "Unauthorized".to_string(),
            }),
            Some(status) => Err(SubmitError::Unreachable {
                status: Some(status),
                detail: "Service Unavailable".to_string(),
            }),
        }
    }
}

// ── Status lines ─────────────────────────────────────────────────────

pub fn drain(rx: &mpsc::Receiver<StatusEvent>) -> Vec<StatusEvent> {
    rx.try_iter().collect()
}

/// Session outcomes only: everything that isn't a progress line.
pub fn outcomes(events: &[StatusEvent]) -> Vec<&StatusEvent> {
    events
        .iter()
        .filter(|e| e.severity != Severity::Progress)
        .collect()
}

/// Poll until the worker has returned the phase to Idle.
pub async fn wait_for_idle<R: HotkeyRegistrar>(controller: &CaptureController<R>) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while controller.phase() != SessionPhase::Idle {
        assert!(
            tokio::time::Instant::now() < deadline,
            "session never returned to Idle (stuck in {:?})",
            controller.phase()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Poll until `count` enumerations have started.
pub async fn wait_for_calls(locator: &FakeLocator, count: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while locator.calls() < count {
        assert!(
            tokio::time::Instant::now() < deadline,
            "locator saw {} calls, expected {}",
            locator.calls(),
            count
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
