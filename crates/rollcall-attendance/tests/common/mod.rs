//! Fake capabilities for driving sessions without a camera or models.
//!
//! Faces are encoded by colour: an image whose top-left pixel is not black
//! holds one face covering the frame, and its encoding is that pixel's
//! normalized RGB.

#![allow(dead_code)]

use chrono::{DateTime, Local, TimeZone};
use image::{Rgb, RgbImage};
use rollcall_core::{BoundingBox, Encoding, FaceEncoder, FaceLocator, VisionError};
use rollcall_hw::{CameraError, Control, Frame, FrameSource, Overlay, Viewer, ViewerError};
use std::collections::VecDeque;
use std::path::Path;

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
/// Detection "fails" on this colour.
pub const MAGENTA: Rgb<u8> = Rgb([255, 0, 255]);

pub fn solid(color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(16, 16, color)
}

pub fn write_image(path: &Path, color: Rgb<u8>) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    solid(color).save(path).unwrap();
}

pub fn local(h: u32, m: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
}

pub struct ColorLocator;

impl FaceLocator for ColorLocator {
    fn locate(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, VisionError> {
        let p = *image.get_pixel(0, 0);
        if p == MAGENTA {
            return Err(VisionError::Other("detector exploded".into()));
        }
        if p == BLACK {
            return Ok(Vec::new());
        }
        Ok(vec![BoundingBox {
            x: 0.0,
            y: 0.0,
            width: image.width() as f32,
            height: image.height() as f32,
            confidence: 0.99,
            landmarks: None,
        }])
    }
}

pub struct ColorEncoder;

impl FaceEncoder for ColorEncoder {
    fn encode(&mut self, image: &RgbImage, faces: &[BoundingBox]) -> Result<Vec<Encoding>, VisionError> {
        let p = image.get_pixel(0, 0);
        let values: Vec<f32> = p.0.iter().map(|&c| c as f32 / 255.0).collect();
        Ok(faces.iter().map(|_| Encoding::new(values.clone())).collect())
    }
}

/// Yields the queued images, then fails like an unplugged camera.
pub struct ScriptedSource {
    frames: VecDeque<RgbImage>,
    sequence: u32,
}

impl ScriptedSource {
    pub fn new(colors: &[Rgb<u8>]) -> Self {
        Self { frames: colors.iter().map(|&c| solid(c)).collect(), sequence: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ScriptedSource {
    fn acquire(&mut self) -> Result<Frame, CameraError> {
        let image = self
            .frames
            .pop_front()
            .ok_or_else(|| CameraError::CaptureFailed("end of script".into()))?;
        self.sequence += 1;
        Ok(Frame { image, timestamp: std::time::Instant::now(), sequence: self.sequence })
    }
}

/// Returns queued controls, one per poll, then `None`. Records what it was shown.
#[derive(Default)]
pub struct ScriptedViewer {
    controls: VecDeque<Option<Control>>,
    pub statuses: Vec<String>,
    pub labels: Vec<Vec<String>>,
}

impl ScriptedViewer {
    pub fn new(controls: &[Option<Control>]) -> Self {
        Self { controls: controls.iter().copied().collect(), ..Self::default() }
    }
}

impl Viewer for ScriptedViewer {
    fn present(&mut self, _image: &RgbImage, overlays: &[Overlay], status: &str) -> Result<(), ViewerError> {
        self.statuses.push(status.to_string());
        self.labels.push(overlays.iter().map(|o| o.label.clone()).collect());
        Ok(())
    }

    fn poll(&mut self) -> Option<Control> {
        self.controls.pop_front().flatten()
    }
}
