//! V4L2 webcam capture via the `v4l` crate.

use crate::frame::{self, Frame};
use crate::FrameSource;
use std::path::Path;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

const REQUESTED_WIDTH: u32 = 640;
const REQUESTED_HEIGHT: u32 = 480;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("could not open webcam: {0}")]
    DeviceNotFound(String),
    #[error("failed to grab frame: {0}")]
    CaptureFailed(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("device does not support video capture")]
    StreamingNotSupported,
}

/// Info about a discovered V4L2 device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Negotiated pixel format for the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// YUYV 4:2:2 packed, the usual uncompressed webcam format.
    Yuyv,
    /// Motion-JPEG, one JPEG image per buffer.
    Mjpeg,
    /// Packed 24-bit RGB.
    Rgb24,
    /// 8-bit grayscale.
    Grey,
}

impl PixelFormat {
    fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"YUYV" => Some(Self::Yuyv),
            b"MJPG" => Some(Self::Mjpeg),
            b"RGB3" => Some(Self::Rgb24),
            b"GREY" => Some(Self::Grey),
            _ => None,
        }
    }
}

/// V4L2 camera device handle.
pub struct Camera {
    device: Device,
    pub width: u32,
    pub height: u32,
    pub device_path: String,
    pub pixel_format: PixelFormat,
}

impl Camera {
    /// Open a V4L2 camera device by path (e.g., "/dev/video0").
    pub fn open(device_path: &str) -> Result<Self, CameraError> {
        if !Path::new(device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path.to_string()));
        }

        let device = Device::with_path(device_path).map_err(|e| {
            if e.to_string().contains("busy") || e.to_string().contains("EBUSY") {
                CameraError::DeviceBusy
            } else {
                CameraError::DeviceNotFound(format!("{device_path}: {e}"))
            }
        })?;

        let caps = device
            .query_caps()
            .map_err(|e| CameraError::CaptureFailed(format!("failed to query capabilities: {e}")))?;
        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(CameraError::StreamingNotSupported);
        }

        let mut fmt = device
            .format()
            .map_err(|e| CameraError::FormatNegotiationFailed(format!("failed to get format: {e}")))?;
        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = REQUESTED_WIDTH;
        fmt.height = REQUESTED_HEIGHT;

        let negotiated = device
            .set_format(&fmt)
            .map_err(|e| CameraError::FormatNegotiationFailed(format!("failed to set format: {e}")))?;

        let pixel_format = PixelFormat::from_fourcc(negotiated.fourcc).ok_or_else(|| {
            CameraError::FormatNegotiationFailed(format!(
                "unsupported pixel format: {:?} (need YUYV, MJPG, RGB3 or GREY)",
                negotiated.fourcc
            ))
        })?;

        tracing::info!(
            device = device_path,
            card = %caps.card,
            width = negotiated.width,
            height = negotiated.height,
            format = ?pixel_format,
            "opened camera"
        );

        Ok(Self {
            device,
            width: negotiated.width,
            height: negotiated.height,
            device_path: device_path.to_string(),
            pixel_format,
        })
    }

    /// Capture a single RGB frame.
    pub fn capture_frame(&self) -> Result<Frame, CameraError> {
        let mut stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, 4)
            .map_err(|e| CameraError::CaptureFailed(format!("failed to create mmap stream: {e}")))?;

        let (buf, meta) = stream
            .next()
            .map_err(|e| CameraError::CaptureFailed(format!("failed to dequeue buffer: {e}")))?;

        let used = (meta.bytesused as usize).min(buf.len());
        let converted = match self.pixel_format {
            PixelFormat::Yuyv => frame::yuyv_to_rgb(buf, self.width, self.height),
            PixelFormat::Mjpeg => frame::mjpeg_to_rgb(&buf[..used]),
            PixelFormat::Rgb24 => frame::rgb24_to_rgb(buf, self.width, self.height),
            PixelFormat::Grey => frame::grey_to_rgb(buf, self.width, self.height),
        };
        let image = converted.map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        Ok(Frame {
            image,
            timestamp: std::time::Instant::now(),
            sequence: meta.sequence,
        })
    }

    /// Discard `count` frames so auto-exposure can settle.
    pub fn warm_up(&self, count: usize) {
        if count == 0 {
            return;
        }
        tracing::debug!(count, "discarding warmup frames");
        for _ in 0..count {
            if let Err(e) = self.capture_frame() {
                tracing::debug!(error = %e, "warmup frame failed");
            }
        }
    }

    /// List available V4L2 video capture devices.
    pub fn list_devices() -> Vec<DeviceInfo> {
        let mut devices = Vec::new();

        for i in 0..16 {
            let path = format!("/dev/video{i}");
            if !Path::new(&path).exists() {
                continue;
            }
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
                continue;
            }
            devices.push(DeviceInfo {
                path,
                name: caps.card.clone(),
                driver: caps.driver.clone(),
                bus: caps.bus.clone(),
            });
        }

        devices
    }
}

impl FrameSource for Camera {
    fn acquire(&mut self) -> Result<Frame, CameraError> {
        self.capture_frame()
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        tracing::debug!(device = %self.device_path, "released camera");
    }
}
