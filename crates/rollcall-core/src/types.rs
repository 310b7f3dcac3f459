use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Clamp the box to integer pixel bounds inside a `width` × `height` image.
    ///
    /// Returns `(left, top, right, bottom)` with `right`/`bottom` exclusive,
    /// or `None` when nothing of the box lies inside the image.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = self.x.floor().max(0.0) as u32;
        let top = self.y.floor().max(0.0) as u32;
        let right = ((self.x + self.width).ceil().max(0.0) as u32).min(width);
        let bottom = ((self.y + self.height).ceil().max(0.0) as u32).min(height);
        (left < right && top < bottom).then_some((left, top, right, bottom))
    }

    /// Intersection-over-Union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }
}

/// Face encoding: the fixed-length vector that represents one face.
///
/// ArcFace encodings are 512-dimensional and L2-normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    pub values: Vec<f32>,
}

impl Encoding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Euclidean distance to another encoding.
    ///
    /// Encodings of different lengths are infinitely far apart.
    pub fn distance(&self, other: &Encoding) -> f32 {
        if self.values.len() != other.values.len() {
            return f32::INFINITY;
        }
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// Return a copy scaled to unit length. Zero vectors are returned as-is.
    pub fn normalized(mut self) -> Self {
        let norm = self.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            self.values.iter_mut().for_each(|v| *v /= norm);
        }
        self
    }
}
