//! Face alignment to the canonical 112×112 ArcFace crop.
//!
//! With landmarks, a 4-DOF similarity transform (scale, rotation,
//! translation) is fitted in closed form and the face is warped with
//! bilinear sampling. Without landmarks the bounding box is cropped to a
//! square and resized.

use crate::types::BoundingBox;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

pub const ALIGNED_SIZE: u32 = 112;

/// ArcFace reference landmarks for a 112×112 output.
const REFERENCE_LANDMARKS_112: [(f32, f32); 5] = [
    (38.2946, 51.6963), // left eye
    (73.5318, 51.5014), // right eye
    (56.0252, 71.7366), // nose
    (41.5493, 92.3655), // left mouth
    (70.7299, 92.2041), // right mouth
];

/// Similarity transform `dst = [a −b; b a]·src + (tx, ty)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Similarity {
    a: f32,
    b: f32,
    tx: f32,
    ty: f32,
}

impl Similarity {
    /// Least-squares fit mapping `src` onto `dst`.
    ///
    /// Returns `None` when the source points are degenerate (all equal).
    fn fit(src: &[(f32, f32); 5], dst: &[(f32, f32); 5]) -> Option<Self> {
        let n = src.len() as f32;
        let (sx_mean, sy_mean) = centroid(src);
        let (dx_mean, dy_mean) = centroid(dst);

        let mut dot = 0.0f32;
        let mut cross = 0.0f32;
        let mut src_var = 0.0f32;
        for (&(sx, sy), &(dx, dy)) in src.iter().zip(dst) {
            let (sx, sy) = (sx - sx_mean, sy - sy_mean);
            let (dx, dy) = (dx - dx_mean, dy - dy_mean);
            dot += sx * dx + sy * dy;
            cross += sx * dy - sy * dx;
            src_var += sx * sx + sy * sy;
        }
        if src_var <= f32::EPSILON * n {
            return None;
        }

        let a = dot / src_var;
        let b = cross / src_var;
        Some(Self {
            a,
            b,
            tx: dx_mean - (a * sx_mean - b * sy_mean),
            ty: dy_mean - (b * sx_mean + a * sy_mean),
        })
    }

    #[cfg(test)]
    fn apply(&self, (x, y): (f32, f32)) -> (f32, f32) {
        (self.a * x - self.b * y + self.tx, self.b * x + self.a * y + self.ty)
    }

    fn invert(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let det = self.a * self.a + self.b * self.b;
        let (x, y) = (x - self.tx, y - self.ty);
        ((self.a * x + self.b * y) / det, (-self.b * x + self.a * y) / det)
    }
}

fn centroid(points: &[(f32, f32); 5]) -> (f32, f32) {
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
    (sx / points.len() as f32, sy / points.len() as f32)
}

/// Produce the 112×112 crop the encoder expects for `face`.
pub fn align_face(image: &RgbImage, face: &BoundingBox) -> RgbImage {
    let transform = face
        .landmarks
        .as_ref()
        .and_then(|lms| Similarity::fit(lms, &REFERENCE_LANDMARKS_112));

    match transform {
        Some(t) => warp(image, &t),
        None => crop_square(image, face),
    }
}

fn warp(image: &RgbImage, transform: &Similarity) -> RgbImage {
    RgbImage::from_fn(ALIGNED_SIZE, ALIGNED_SIZE, |u, v| {
        let (sx, sy) = transform.invert((u as f32, v as f32));
        sample_bilinear(image, sx, sy)
    })
}

/// Bilinear sample; coordinates outside the image read as black.
fn sample_bilinear(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || x < 0.0 || y < 0.0 || x > (w - 1) as f32 || y > (h - 1) as f32 {
        return Rgb([0, 0, 0]);
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let tl = image.get_pixel(x0, y0).0;
    let tr = image.get_pixel(x1, y0).0;
    let bl = image.get_pixel(x0, y1).0;
    let br = image.get_pixel(x1, y1).0;

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = tl[c] as f32 * (1.0 - fx) + tr[c] as f32 * fx;
        let bottom = bl[c] as f32 * (1.0 - fx) + br[c] as f32 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

fn crop_square(image: &RgbImage, face: &BoundingBox) -> RgbImage {
    let side = face.width.max(face.height);
    let cx = face.x + face.width / 2.0;
    let cy = face.y + face.height / 2.0;
    let square = BoundingBox {
        x: cx - side / 2.0,
        y: cy - side / 2.0,
        width: side,
        height: side,
        ..face.clone()
    };

    match square.pixel_bounds(image.width(), image.height()) {
        Some((left, top, right, bottom)) => {
            let crop = imageops::crop_imm(image, left, top, right - left, bottom - top).to_image();
            imageops::resize(&crop, ALIGNED_SIZE, ALIGNED_SIZE, FilterType::Triangle)
        }
        None => RgbImage::new(ALIGNED_SIZE, ALIGNED_SIZE),
    }
}
