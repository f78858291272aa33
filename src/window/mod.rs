//! Window discovery: public API.
//!
//! Finding the target is split in two: a backend lists top-level windows
//! (`WindowLocator::list`), and `select_window` picks one. The selection is
//! pure so the tie-break rules are testable without a desktop.

#[cfg(feature = "desktop")]
mod xcap_locator;

#[cfg(feature = "desktop")]
pub use xcap_locator::XcapWindowLocator;

use std::fmt;

/// Opaque platform window id (HWND / CGWindowID / X11 window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u32);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A top-level window as reported by the backend, in enumeration order.
#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub handle: WindowHandle,
    pub title: String,
    pub is_focused: bool,
    pub is_minimized: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("No window title contains '{0}'")]
    NotFound(String),

    #[error("Failed to enumerate windows: {0}")]
    Enumeration(String),
}

pub trait WindowLocator: Send + Sync {
    /// Top-level windows in the platform's enumeration order.
    fn list(&self) -> Result<Vec<WindowInfo>, LocateError>;

    /// Ask the OS to bring the window to the foreground. Best-effort.
    fn focus(&self, handle: WindowHandle) -> bool;

    /// Find the window whose title contains `title_substring`
    /// (case-insensitive). See `select_window` for tie-breaks.
    fn find(&self, title_substring: &str) -> Result<WindowInfo, LocateError> {
        let windows = self.list()?;
        select_window(&windows, title_substring)
            .cloned()
            .ok_or_else(|| LocateError::NotFound(title_substring.to_string()))
    }
}

/// Pick the matching window.
///
/// Tie-break: the focused (foreground-most) match wins; otherwise the first
/// match in enumeration order. An empty needle matches nothing.
pub fn select_window<'a>(windows: &'a [WindowInfo], title_substring: &str) -> Option<&'a WindowInfo> {
    let needle = title_substring.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let mut first = None;
    for window in windows {
        if !window.title.to_lowercase().contains(&needle) {
            continue;
        }
        if window.is_focused {
            return Some(window);
        }
        first.get_or_insert(window);
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    fn win(id: u32, title: &str, focused: bool) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle(id),
            title: title.to_string(),
            is_focused: focused,
            is_minimized: false,
        }
    }

    #[test]
    fn match_is_case_insensitive_substring() {
        let windows = vec![win(1, "Terminal", false), win(2, "FOXHOLE — War", false)];
        let found = select_window(&windows, "foxhole").unwrap();
        assert_eq!(found.handle, WindowHandle(2));
    }

    #[test]
    fn no_match_returns_none() {
        let windows = vec![win(1, "Terminal", true)];
        assert!(select_window(&windows, "Foxhole").is_none());
    }

    #[test]
    fn first_in_enumeration_order_without_focus() {
        let windows = vec![win(7, "War", false), win(3, "War", false)];
        assert_eq!(select_window(&windows, "war").unwrap().handle, WindowHandle(7));
    }

    #[test]
    fn focused_match_beats_enumeration_order() {
        let windows = vec![
            win(7, "War", false),
            win(8, "Editor", true),
            win(3, "War", true),
        ];
        assert_eq!(select_window(&windows, "War").unwrap().handle, WindowHandle(3));
    }

    #[test]
    fn empty_needle_matches_nothing() {
        let windows = vec![win(1, "War", true)];
        assert!(select_window(&windows, "  ").is_none());
    }

    struct Fixed(Vec<WindowInfo>);

    impl WindowLocator for Fixed {
        fn list(&self) -> Result<Vec<WindowInfo>, LocateError> {
            Ok(self.0.clone())
        }

        fn focus(&self, _handle: WindowHandle) -> bool {
            false
        }
    }

    #[test]
    fn find_reports_not_found_with_needle() {
        let locator = Fixed(vec![win(1, "Terminal", false)]);
        match locator.find("Foxhole") {
            Err(LocateError::NotFound(needle)) => assert_eq!(needle, "Foxhole"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
