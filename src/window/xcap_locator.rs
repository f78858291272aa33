//! Window enumeration using the `xcap` crate.
//!
//! This is the infrastructure layer that talks to the OS. Foreground
//! activation is only wired up on Windows; elsewhere focus reports false
//! and capture proceeds against the window as-is.

use super::{LocateError, WindowHandle, WindowInfo, WindowLocator};
use xcap::Window;

#[derive(Debug, Default, Clone, Copy)]
pub struct XcapWindowLocator;

impl XcapWindowLocator {
    pub fn new() -> Self {
        Self
    }
}

impl WindowLocator for XcapWindowLocator {
    fn list(&self) -> Result<Vec<WindowInfo>, LocateError> {
        let windows = Window::all().map_err(|e| LocateError::Enumeration(e.to_string()))?;

        let infos: Vec<WindowInfo> = windows
            .iter()
            .filter_map(|w| {
                // Windows that vanish mid-enumeration fail their getters; skip them.
                let id = w.id().ok()?;
                let title = w.title().unwrap_or_default();
                Some(WindowInfo {
                    handle: WindowHandle(id),
                    title,
                    is_focused: w.is_focused().unwrap_or(false),
                    is_minimized: w.is_minimized().unwrap_or(false),
                })
            })
            .collect();

        log::debug!("[WINDOW] Enumerated {} top-level windows", infos.len());
        Ok(infos)
    }

    fn focus(&self, handle: WindowHandle) -> bool {
        let focused = platform::set_foreground(handle);
        if focused {
            log::info!("[WINDOW] Brought {} to foreground", handle);
        } else {
            log::log!(
                focus_failure_level(platform::SUPPORTED),
                "[WINDOW] Could not bring {} to foreground",
                handle
            );
        }
        focused
    }
}

/// A refusal is only worth a warning where activation is implemented.
fn focus_failure_level(supported: bool) -> log::Level {
    if supported {
        log::Level::Warn
    } else {
        log::Level::Debug
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use super::WindowHandle;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::SetForegroundWindow;

    pub const SUPPORTED: bool = true;

    pub fn set_foreground(handle: WindowHandle) -> bool {
        let hwnd = HWND(handle.0 as usize as *mut core::ffi::c_void);
        // SAFETY: SetForegroundWindow validates the handle and fails on
        // stale or foreign windows instead of dereferencing it.
        unsafe { SetForegroundWindow(hwnd).as_bool() }
    }
}

#[cfg(not(target_os = "windows"))]
mod platform {
    use super::WindowHandle;

    pub const SUPPORTED: bool = false;

    pub fn set_foreground(_handle: WindowHandle) -> bool {
        false
    }
}
