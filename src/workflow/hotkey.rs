//! The seam between the controller and the OS hotkey hook.

use crate::keybind::Keybind;

/// Id the OS listener reports when a registered hotkey fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotkeyId(pub u32);

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct RegistrarError(pub String);

/// Registers global hotkeys with the platform.
///
/// Only the thread that owns the controller calls this, so implementations
/// may hold thread-bound OS handles.
pub trait HotkeyRegistrar {
    fn register(&mut self, keybind: &Keybind) -> Result<HotkeyId, RegistrarError>;
    fn unregister(&mut self, id: HotkeyId) -> Result<(), RegistrarError>;
}
