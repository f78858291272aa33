//! System tray icon and menu.
//!
//! The tray is the only window-system surface: Start/Stop capture, Reload
//! settings, Quit. The tooltip mirrors the latest status line.

use crate::status::{Severity, StatusEvent};
use tray_icon::menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

const TOOLTIP: &str = "Stockpile Capture";

/// What a menu click asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    ToggleCapture,
    ReloadSettings,
    Quit,
}

pub struct Tray {
    icon: TrayIcon,
    toggle: MenuItem,
    reload: MenuItem,
    quit: MenuItem,
}

impl Tray {
    /// Build the tray. Must run after the event loop has started.
    pub fn build() -> Result<Self, Box<dyn std::error::Error>> {
        let toggle = MenuItem::new("Start capture", true, None);
        let reload = MenuItem::new("Reload settings", true, None);
        let quit = MenuItem::new("Quit Stockpile Capture", true, None);

        let menu = Menu::new();
        menu.append(&toggle)?;
        menu.append(&reload)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&quit)?;

        let icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(TOOLTIP)
            .with_icon(build_icon()?)
            .build()?;

        Ok(Self {
            icon,
            toggle,
            reload,
            quit,
        })
    }

    pub fn action_for(&self, event: &MenuEvent) -> Option<TrayAction> {
        let id = event.id();
        if id == self.toggle.id() {
            Some(TrayAction::ToggleCapture)
        } else if id == self.reload.id() {
            Some(TrayAction::ReloadSettings)
        } else if id == self.quit.id() {
            Some(TrayAction::Quit)
        } else {
            None
        }
    }

    pub fn set_armed(&self, armed: bool) {
        self.toggle
            .set_text(if armed { "Stop capture" } else { "Start capture" });
    }

    pub fn show_status(&self, event: &StatusEvent) {
        if event.severity == Severity::Progress {
            return;
        }
        let tooltip = format!("{}\n{}", TOOLTIP, event.render());
        if let Err(e) = self.icon.set_tooltip(Some(tooltip)) {
            log::debug!("[TRAY] Failed to update tooltip: {}", e);
        }
    }
}

/// 18x18 crosshair-in-a-frame, drawn in code so no asset ships with the binary.
fn build_icon() -> Result<Icon, tray_icon::BadIcon> {
    let size = 18usize;
    let mut rgba = Vec::with_capacity(size * size * 4);
    for y in 0..size {
        for x in 0..size {
            let border = x == 0 || y == 0 || x == size - 1 || y == size - 1;
            let arm = 3..size - 3;
            let cross = (x == size / 2 && arm.contains(&y)) || (y == size / 2 && arm.contains(&x));
            let alpha = if border || cross { 255 } else { 0 };
            rgba.extend_from_slice(&[0, 0, 0, alpha]);
        }
    }
    Icon::from_rgba(rgba, size as u32, size as u32)
}
