//! env_logger setup from the `logging` config section.
//!
//! RUST_LOG, when set, overrides the config entirely.

use crate::config::{ConfigError, LoggingSettings, Settings};

/// Build the filter string: default level first, then per-module levels.
pub fn filter_directives(settings: &LoggingSettings) -> String {
    let level = match settings.level.trim() {
        "" => "info",
        level => level,
    };
    let mut directives = vec![level.to_lowercase()];
    for (module, module_level) in &settings.modules {
        directives.push(format!("{}={}", module.trim(), module_level.trim().to_lowercase()));
    }
    directives.join(",")
}

/// The `logging` section of a startup load, or defaults when the file could
/// not be read. The error is handed back so it can be logged once the
/// logger exists.
pub fn startup_settings(
    loaded: Result<Settings, ConfigError>,
) -> (LoggingSettings, Option<ConfigError>) {
    match loaded {
        Ok(settings) => (settings.logging, None),
        Err(e) => (LoggingSettings::default(), Some(e)),
    }
}

/// Initialise the global logger. Safe to call more than once.
pub fn init(settings: &LoggingSettings) {
    let mut builder = env_logger::Builder::new();
    match std::env::var("RUST_LOG") {
        Ok(env) if !env.trim().is_empty() => builder.parse_filters(&env),
        _ => builder.parse_filters(&filter_directives(settings)),
    };
    if builder.try_init().is_err() {
        log::debug!("[STARTUP] Logger already initialised");
    }
}
