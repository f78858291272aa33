//! Stockpile Capture: press a hotkey, screenshot the game window, submit it.
//!
//! This is the app shell that wires together all domains. No business logic
//! lives here, only module declarations and the event loop.
//!
//! Domains:
//!   - config:   settings model, JSON store, token resolution
//!   - keybind:  hotkey string parsing
//!   - window:   target window discovery
//!   - capture:  window screenshot + PNG encoding
//!   - submit:   authenticated upload to the processing server
//!   - workflow: arm/disarm and the locate → capture → submit state machine
//!   - status:   ordered, user-visible status lines

pub mod capture;
pub mod config;
pub mod keybind;
pub mod logging;
pub mod status;
pub mod submit;
pub mod window;
pub mod workflow;

#[cfg(feature = "desktop")]
mod hotkeys;
#[cfg(feature = "desktop")]
mod tray;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use crate::capture::XcapCapturer;
    use crate::config::{ConfigError, ConfigStore};
    use crate::hotkeys::GlobalHotkeyRegistrar;
    use crate::status::{StatusEvent, StatusLog, StatusSink};
    use crate::submit::HttpSubmitter;
    use crate::tray::{Tray, TrayAction};
    use crate::window::XcapWindowLocator;
    use crate::workflow::{self, CaptureController, FailureKind, HotkeyId};
    use global_hotkey::{GlobalHotKeyEvent, HotKeyState};
    use std::sync::{Arc, Mutex};
    use tao::event::{Event, StartCause};
    use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
    use tray_icon::menu::MenuEvent;

    /// Everything the UI thread reacts to arrives through the event loop,
    /// so status lines are rendered in the order they were emitted.
    #[derive(Debug, Clone)]
    enum UserEvent {
        Hotkey(GlobalHotKeyEvent),
        Menu(MenuEvent),
        Status(StatusEvent),
    }

    /// Marshals status lines from any thread onto the UI thread.
    struct EventLoopSink(Mutex<EventLoopProxy<UserEvent>>);

    impl StatusSink for EventLoopSink {
        fn emit(&self, event: StatusEvent) {
            match self.0.lock() {
                Ok(proxy) => {
                    if proxy.send_event(UserEvent::Status(event)).is_err() {
                        log::debug!("[STATUS] Event loop closed, status line discarded");
                    }
                }
                Err(_) => log::error!("[STATUS] Event loop proxy poisoned"),
            }
        }
    }

    /// Load .env.local → .env from the working directory, first hit wins.
    fn load_env() {
        for env_file in [".env.local", ".env"] {
            let path = std::path::Path::new(env_file);
            if path.exists() {
                match dotenvy::from_path(path) {
                    Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                    Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
                }
                break;
            }
        }
    }

    fn arm_from_store<R: workflow::HotkeyRegistrar>(
        controller: &mut CaptureController<R>,
        store: &ConfigStore,
        sink: &dyn StatusSink,
    ) {
        match store.load() {
            // arm() reports its own failures to the sink.
            Ok(settings) => {
                let _ = controller.arm(settings);
            }
            Err(e) => sink.emit(load_failure(&e)),
        }
    }

    fn load_failure(err: &ConfigError) -> StatusEvent {
        StatusEvent::error(
            FailureKind::ConfigurationIncomplete,
            format!("Could not load settings: {}", err),
        )
    }

    /// Entry point. Builds the runtime, arms the hotkey and runs the event loop.
    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        load_env();

        let store = ConfigStore::default_location();
        let (logging, load_error) = crate::logging::startup_settings(store.load_raw());
        crate::logging::init(&logging);
        log::info!("Stockpile Capture starting up");
        log::info!("[CONFIG] Using {}", store.path().display());
        if let Some(e) = load_error {
            log::warn!("[CONFIG] Logging section ignored, using defaults: {}", e);
        }

        // No console in Windows release builds; the file keeps every line.
        let mut status_log = match StatusLog::open(store.status_log_path()) {
            Ok(status_log) => {
                log::info!("[STATUS] Writing status lines to {}", status_log.path().display());
                Some(status_log)
            }
            Err(e) => {
                log::warn!(
                    "[STATUS] Cannot open {}: {}",
                    store.status_log_path().display(),
                    e
                );
                None
            }
        };

        let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();

        let hotkey_proxy = event_loop.create_proxy();
        GlobalHotKeyEvent::set_event_handler(Some(move |event| {
            let _ = hotkey_proxy.send_event(UserEvent::Hotkey(event));
        }));
        let menu_proxy = event_loop.create_proxy();
        MenuEvent::set_event_handler(Some(move |event| {
            let _ = menu_proxy.send_event(UserEvent::Menu(event));
        }));

        let sink: Arc<dyn StatusSink> =
            Arc::new(EventLoopSink(Mutex::new(event_loop.create_proxy())));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("stockpile-worker")
            .build()?;

        let (mut controller, worker) = workflow::pipeline(
            GlobalHotkeyRegistrar::new()?,
            XcapWindowLocator::new(),
            XcapCapturer::new(),
            HttpSubmitter::new()?,
            Arc::clone(&sink),
        );
        runtime.spawn(worker.run());

        let mut tray: Option<Tray> = None;

        event_loop.run(move |event, _target, control_flow| {
            *control_flow = ControlFlow::Wait;
            // The runtime must outlive the loop; the closure owns it.
            let _ = &runtime;

            match event {
                Event::NewEvents(StartCause::Init) => {
                    match Tray::build() {
                        Ok(t) => tray = Some(t),
                        Err(e) => log::error!("[TRAY] Failed to build tray icon: {}", e),
                    }
                    arm_from_store(&mut controller, &store, sink.as_ref());
                }
                Event::UserEvent(UserEvent::Hotkey(hotkey_event)) => {
                    if hotkey_event.state == HotKeyState::Pressed {
                        let dispatch = controller.on_hotkey_event(HotkeyId(hotkey_event.id));
                        log::debug!("[HOTKEY] Press {} -> {:?}", hotkey_event.id, dispatch);
                    }
                }
                Event::UserEvent(UserEvent::Status(status)) => {
                    status.log();
                    if let Some(file) = status_log.as_mut() {
                        if let Err(e) = file.append(&status) {
                            log::warn!("[STATUS] Failed to write status log: {}", e);
                        }
                    }
                    #[cfg(debug_assertions)]
                    println!("{}", status.render());
                    if let Some(tray) = &tray {
                        tray.show_status(&status);
                    }
                }
                Event::UserEvent(UserEvent::Menu(menu_event)) => {
                    let action = tray.as_ref().and_then(|t| t.action_for(&menu_event));
                    match action {
                        Some(TrayAction::ToggleCapture) => {
                            if controller.is_armed() {
                                controller.disarm();
                            } else {
                                arm_from_store(&mut controller, &store, sink.as_ref());
                            }
                        }
                        Some(TrayAction::ReloadSettings) => match store.load() {
                            Ok(settings) => {
                                let armed = controller.is_armed();
                                sink.emit(StatusEvent::info("Settings reloaded."));
                                if armed {
                                    let _ = controller.arm(settings);
                                }
                            }
                            Err(e) => sink.emit(load_failure(&e)),
                        },
                        Some(TrayAction::Quit) => {
                            log::info!("Quit requested from tray menu");
                            controller.disarm();
                            *control_flow = ControlFlow::Exit;
                        }
                        None => {}
                    }
                }
                _ => {}
            }

            if let Some(tray) = &tray {
                tray.set_armed(controller.is_armed());
            }
        })
    }
}
