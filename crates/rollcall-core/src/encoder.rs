//! ArcFace face encoder via ONNX Runtime.
//!
//! Each located face is aligned to a 112×112 crop and passed through the
//! w600k_r50 model, producing an L2-normalized 512-dimensional encoding.

use crate::alignment::{self, ALIGNED_SIZE};
use crate::types::{BoundingBox, Encoding};
use crate::vision::{FaceEncoder, VisionError};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const ARCFACE_MEAN: f32 = 127.5;
const ARCFACE_STD: f32 = 127.5; // symmetric, unlike SCRFD's 128.0
pub const ARCFACE_ENCODING_DIM: usize = 512;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("model file not found: {0} (place w600k_r50.onnx in the model directory)")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// ArcFace-based face encoder.
pub struct ArcFaceEncoder {
    session: Session,
}

impl ArcFaceEncoder {
    /// Load the ArcFace ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, EncoderError> {
        if !model_path.exists() {
            return Err(EncoderError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(path = %model_path.display(), "loaded ArcFace model");
        Ok(Self { session })
    }

    /// Encode a single face.
    pub fn encode_face(&mut self, image: &RgbImage, face: &BoundingBox) -> Result<Encoding, EncoderError> {
        let aligned = alignment::align_face(image, face);
        let input = to_tensor(&aligned);

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EncoderError::InferenceFailed(format!("encoding extraction: {e}")))?;

        if raw.len() != ARCFACE_ENCODING_DIM {
            return Err(EncoderError::InferenceFailed(format!(
                "expected {ARCFACE_ENCODING_DIM}-dim encoding, got {}",
                raw.len()
            )));
        }

        Ok(Encoding::new(raw.to_vec()).normalized())
    }
}

impl FaceEncoder for ArcFaceEncoder {
    fn encode(&mut self, image: &RgbImage, faces: &[BoundingBox]) -> Result<Vec<Encoding>, VisionError> {
        faces
            .iter()
            .map(|face| self.encode_face(image, face).map_err(VisionError::from))
            .collect()
    }
}

/// Convert an aligned 112×112 RGB crop into a normalized NCHW tensor.
fn to_tensor(aligned: &RgbImage) -> Array4<f32> {
    let size = ALIGNED_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in aligned.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 - ARCFACE_MEAN) / ARCFACE_STD;
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_tensor_shape() {
        let aligned = RgbImage::new(ALIGNED_SIZE, ALIGNED_SIZE);
        let tensor = to_tensor(&aligned);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[test]
    fn test_tensor_channel_order_and_range() {
        let aligned = RgbImage::from_pixel(ALIGNED_SIZE, ALIGNED_SIZE, Rgb([255, 0, 128]));
        let tensor = to_tensor(&aligned);
        assert!((tensor[[0, 0, 5, 7]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 1, 5, 7]] + 1.0).abs() < 1e-6);
        let expected = (128.0 - ARCFACE_MEAN) / ARCFACE_STD;
        assert!((tensor[[0, 2, 5, 7]] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_model() {
        let err = ArcFaceEncoder::load(Path::new("/nonexistent/w600k_r50.onnx")).err();
        assert!(matches!(err, Some(EncoderError::ModelNotFound(_))));
    }
}
