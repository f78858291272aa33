//! Screenshot capture domain: public API.
//!
//! The capturer turns a located window into an in-memory image. It must not
//! require the window to be in the foreground: players alt-tab right after
//! pressing the hotkey.

mod encode;
#[cfg(feature = "desktop")]
mod xcap_capturer;

pub use encode::{encode_png, EncodeError};
#[cfg(feature = "desktop")]
pub use xcap_capturer::XcapCapturer;

use crate::window::WindowHandle;
use image::DynamicImage;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Window {0} no longer exists")]
    StaleHandle(WindowHandle),

    #[error("Window {0} is minimized")]
    Minimized(WindowHandle),

    #[error("Captured region is empty ({width}x{height})")]
    EmptyRegion { width: u32, height: u32 },

    #[error("Screen capture failed: {0}")]
    Backend(String),
}

pub trait ScreenshotCapturer: Send + Sync {
    /// Capture the window's visible pixels as they are right now.
    fn capture(&self, handle: WindowHandle) -> Result<DynamicImage, CaptureError>;
}

/// Reject zero-area captures (window collapsed, compositor returned nothing).
pub fn ensure_non_empty(image: DynamicImage) -> Result<DynamicImage, CaptureError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(CaptureError::EmptyRegion { width, height });
    }
    Ok(image)
}
