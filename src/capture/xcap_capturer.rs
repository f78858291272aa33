//! Window capture using the `xcap` crate.
//!
//! This is the infrastructure layer that talks to the OS. The handle is
//! re-resolved on every call so a window closed between locate and capture
//! surfaces as a stale handle instead of a backend error.

use super::{ensure_non_empty, CaptureError, ScreenshotCapturer};
use crate::window::WindowHandle;
use image::DynamicImage;
use xcap::Window;

#[derive(Debug, Default, Clone, Copy)]
pub struct XcapCapturer;

impl XcapCapturer {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenshotCapturer for XcapCapturer {
    fn capture(&self, handle: WindowHandle) -> Result<DynamicImage, CaptureError> {
        let start = std::time::Instant::now();

        let windows = Window::all().map_err(|e| CaptureError::Backend(e.to_string()))?;
        let window = windows
            .into_iter()
            .find(|w| w.id().map(|id| id == handle.0).unwrap_or(false))
            .ok_or(CaptureError::StaleHandle(handle))?;

        if window.is_minimized().unwrap_or(false) {
            return Err(CaptureError::Minimized(handle));
        }

        let image = window
            .capture_image()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        let image = ensure_non_empty(DynamicImage::ImageRgba8(image))?;
        log::info!(
            "[CAPTURE] {}x{} from window {} in {}ms",
            image.width(),
            image.height(),
            handle,
            start.elapsed().as_millis()
        );
        Ok(image)
    }
}
