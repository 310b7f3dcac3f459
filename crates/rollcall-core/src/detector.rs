//! SCRFD face detector via ONNX Runtime.
//!
//! The frame is letterboxed into a 640×640 RGB tensor, the three stride
//! heads (8, 16, 32) are decoded into boxes with landmarks, and
//! overlapping boxes are removed with non-maximum suppression.

use crate::types::BoundingBox;
use crate::vision::{FaceLocator, VisionError};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const SCRFD_INPUT_SIZE: u32 = 640;
const SCRFD_MEAN: f32 = 127.5;
const SCRFD_STD: f32 = 128.0;
const SCRFD_CONFIDENCE_THRESHOLD: f32 = 0.5;
const SCRFD_NMS_THRESHOLD: f32 = 0.4;
const SCRFD_STRIDES: [usize; 3] = [8, 16, 32];
const SCRFD_ANCHORS_PER_CELL: usize = 2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} (place det_10g.onnx in the model directory)")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("empty image")]
    EmptyImage,
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Where the resized frame sits inside the square model input.
#[derive(Debug, Clone, Copy)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

impl Letterbox {
    fn fit(width: u32, height: u32) -> Self {
        let scale = (SCRFD_INPUT_SIZE as f32 / width as f32).min(SCRFD_INPUT_SIZE as f32 / height as f32);
        let (new_w, new_h) = Self::scaled_size(width, height, scale);
        Self {
            scale,
            pad_x: ((SCRFD_INPUT_SIZE - new_w) / 2) as f32,
            pad_y: ((SCRFD_INPUT_SIZE - new_h) / 2) as f32,
        }
    }

    fn scaled_size(width: u32, height: u32, scale: f32) -> (u32, u32) {
        let w = ((width as f32 * scale).round() as u32).clamp(1, SCRFD_INPUT_SIZE);
        let h = ((height as f32 * scale).round() as u32).clamp(1, SCRFD_INPUT_SIZE);
        (w, h)
    }

    /// Map a point in model-input space back to frame space.
    fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Output tensor indices for one stride: (score, bbox, kps).
type StrideOutputs = (usize, usize, usize);

/// SCRFD-based face locator.
pub struct ScrfdDetector {
    session: Session,
    stride_outputs: [StrideOutputs; 3],
}

impl ScrfdDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session.outputs().iter().map(|o| o.name().to_string()).collect();
        tracing::info!(path = %model_path.display(), outputs = ?output_names, "loaded SCRFD model");

        if output_names.len() < 9 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires 9 outputs (3 strides × score/bbox/kps), got {}",
                output_names.len()
            )));
        }

        let stride_outputs = output_layout(&output_names);
        tracing::debug!(?stride_outputs, "SCRFD output mapping");

        Ok(Self { session, stride_outputs })
    }

    /// Detect faces, returning boxes sorted by confidence (highest first).
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, DetectorError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DetectorError::EmptyImage);
        }

        let (input, letterbox) = preprocess(image);
        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut candidates = Vec::new();
        for (pos, &stride) in SCRFD_STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx, kps_idx) = self.stride_outputs[pos];
            let extract = |idx: usize, what: &str| {
                outputs[idx]
                    .try_extract_tensor::<f32>()
                    .map(|(_, data)| data)
                    .map_err(|e| DetectorError::InferenceFailed(format!("{what} stride {stride}: {e}")))
            };
            let heads = StrideHeads {
                scores: extract(score_idx, "scores")?,
                boxes: extract(bbox_idx, "bboxes")?,
                kps: extract(kps_idx, "kps")?,
            };
            candidates.extend(heads.decode(stride, &letterbox, SCRFD_CONFIDENCE_THRESHOLD));
        }

        Ok(suppress_overlaps(candidates, SCRFD_NMS_THRESHOLD))
    }
}

impl FaceLocator for ScrfdDetector {
    fn locate(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, VisionError> {
        Ok(self.detect(image)?)
    }
}

/// Find score/bbox/kps tensors for each stride by name ("score_8", "bbox_16", ...),
/// falling back to the standard export order: scores 0–2, boxes 3–5, kps 6–8.
fn output_layout(names: &[String]) -> [StrideOutputs; 3] {
    let find = |prefix: &str, stride: usize| {
        let target = format!("{prefix}_{stride}");
        names.iter().position(|n| *n == target)
    };

    let named: Option<Vec<StrideOutputs>> = SCRFD_STRIDES
        .iter()
        .map(|&s| Some((find("score", s)?, find("bbox", s)?, find("kps", s)?)))
        .collect();

    match named {
        Some(v) => [v[0], v[1], v[2]],
        None => {
            tracing::info!(?names, "SCRFD output names not recognized, using positional mapping");
            [(0, 3, 6), (1, 4, 7), (2, 5, 8)]
        }
    }
}

/// Letterbox an RGB frame into a normalized 1×3×640×640 tensor.
fn preprocess(image: &RgbImage) -> (Array4<f32>, Letterbox) {
    let letterbox = Letterbox::fit(image.width(), image.height());
    let (new_w, new_h) = Letterbox::scaled_size(image.width(), image.height(), letterbox.scale);
    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let size = SCRFD_INPUT_SIZE as usize;
    // Padding is left at zero, which is what SCRFD_MEAN normalizes to.
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    let (ox, oy) = (letterbox.pad_x as usize, letterbox.pad_y as usize);
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, oy + y as usize, ox + x as usize]] = (pixel[c] as f32 - SCRFD_MEAN) / SCRFD_STD;
        }
    }

    (tensor, letterbox)
}

/// Raw head outputs for one stride.
struct StrideHeads<'a> {
    scores: &'a [f32],
    boxes: &'a [f32],
    kps: &'a [f32],
}

impl StrideHeads<'_> {
    fn decode(&self, stride: usize, letterbox: &Letterbox, threshold: f32) -> Vec<BoundingBox> {
        let grid = SCRFD_INPUT_SIZE as usize / stride;
        let anchors = grid * grid * SCRFD_ANCHORS_PER_CELL;
        let step = stride as f32;

        (0..anchors)
            .filter_map(|idx| {
                let score = *self.scores.get(idx)?;
                if score <= threshold {
                    return None;
                }
                let cell = idx / SCRFD_ANCHORS_PER_CELL;
                let ax = (cell % grid) as f32 * step;
                let ay = (cell / grid) as f32 * step;

                let d = self.boxes.get(idx * 4..idx * 4 + 4)?;
                let (x1, y1) = letterbox.unmap(ax - d[0] * step, ay - d[1] * step);
                let (x2, y2) = letterbox.unmap(ax + d[2] * step, ay + d[3] * step);

                let landmarks = self.kps.get(idx * 10..idx * 10 + 10).map(|k| {
                    std::array::from_fn(|i| letterbox.unmap(ax + k[i * 2] * step, ay + k[i * 2 + 1] * step))
                });

                Some(BoundingBox {
                    x: x1,
                    y: y1,
                    width: x2 - x1,
                    height: y2 - y1,
                    confidence: score,
                    landmarks,
                })
            })
            .collect()
    }
}

/// Greedy non-maximum suppression. Output is sorted by confidence.
fn suppress_overlaps(mut candidates: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<BoundingBox> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}
