//! Global hotkey registration via the `global-hotkey` crate.
//!
//! The manager must be created and used on the thread that runs the event
//! loop (a requirement on macOS and Windows), which is why the controller
//! owning this registrar stays on the UI thread.

use crate::keybind::Keybind;
use crate::workflow::{HotkeyId, HotkeyRegistrar, RegistrarError};
use global_hotkey::hotkey::HotKey;
use global_hotkey::GlobalHotKeyManager;
use std::collections::HashMap;

pub struct GlobalHotkeyRegistrar {
    manager: GlobalHotKeyManager,
    registered: HashMap<u32, HotKey>,
}

impl GlobalHotkeyRegistrar {
    pub fn new() -> Result<Self, global_hotkey::Error> {
        Ok(Self {
            manager: GlobalHotKeyManager::new()?,
            registered: HashMap::new(),
        })
    }
}

impl HotkeyRegistrar for GlobalHotkeyRegistrar {
    fn register(&mut self, keybind: &Keybind) -> Result<HotkeyId, RegistrarError> {
        let hotkey: HotKey = keybind
            .to_string()
            .parse()
            .map_err(|e: global_hotkey::hotkey::HotKeyParseError| {
                RegistrarError(format!("platform does not recognize '{}': {}", keybind, e))
            })?;
        self.manager
            .register(hotkey)
            .map_err(|e| RegistrarError(e.to_string()))?;
        let id = hotkey.id();
        self.registered.insert(id, hotkey);
        Ok(HotkeyId(id))
    }

    fn unregister(&mut self, id: HotkeyId) -> Result<(), RegistrarError> {
        let Some(hotkey) = self.registered.remove(&id.0) else {
            return Ok(());
        };
        self.manager
            .unregister(hotkey)
            .map_err(|e| RegistrarError(e.to_string()))
    }
}
