//! rollcall-hw — Hardware abstraction for webcam capture and live preview.
//!
//! Provides V4L2-based camera access producing RGB frames, and a preview
//! window that draws face overlays and reports key presses. Sessions
//! depend only on the [`FrameSource`] and [`Viewer`] traits.

pub mod camera;
pub mod frame;
pub mod overlay;
pub mod preview;

pub use camera::{Camera, CameraError, DeviceInfo, PixelFormat};
pub use frame::Frame;
pub use overlay::{Color, Overlay};
pub use preview::{PreviewWindow, ViewerError};

use image::RgbImage;

/// A blocking source of video frames. Dropping it releases the device.
pub trait FrameSource {
    fn acquire(&mut self) -> Result<Frame, CameraError>;
}

/// User input polled from the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Quit key pressed or window closed.
    Quit,
    /// Capture key pressed.
    Capture,
}

/// Somewhere to show frames and read controls from.
pub trait Viewer {
    /// Display `image` with `overlays` drawn on top and `status` as the caption.
    fn present(&mut self, image: &RgbImage, overlays: &[Overlay], status: &str) -> Result<(), ViewerError>;

    /// Control pressed since the last call, if any.
    fn poll(&mut self) -> Option<Control>;
}
