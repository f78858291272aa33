// Prevents an extra console window on Windows release builds.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    if let Err(e) = stockpile_capture_lib::run() {
        eprintln!("[STARTUP] Fatal: {}", e);
        std::process::exit(1);
    }
}
