//! Capability traits for face location and encoding.

use crate::detector::DetectorError;
use crate::encoder::EncoderError;
use crate::types::{BoundingBox, Encoding};
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),
    #[error("encoder: {0}")]
    Encoder(#[from] EncoderError),
    #[error("{0}")]
    Other(String),
}

/// Locates faces in an image.
pub trait FaceLocator {
    /// Bounding boxes of every face found, highest confidence first.
    fn locate(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, VisionError>;
}

/// Turns located faces into encodings.
pub trait FaceEncoder {
    /// One encoding per entry of `faces`, in the same order.
    fn encode(&mut self, image: &RgbImage, faces: &[BoundingBox]) -> Result<Vec<Encoding>, VisionError>;
}
