//! Frame type and pixel-format conversion to RGB.

use image::RgbImage;

/// A captured RGB camera frame.
#[derive(Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("MJPEG decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Convert packed YUYV (4:2:2) to RGB using BT.601 coefficients.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]; both pixels share U and V.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let pixels = (width * height) as usize;
    let expected = pixels * 2;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength { expected, actual: yuyv.len() });
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for chunk in yuyv[..expected].chunks_exact(4) {
        let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
        rgb.extend_from_slice(&ycbcr_to_rgb(y0, u, v));
        rgb.extend_from_slice(&ycbcr_to_rgb(y1, u, v));
    }
    to_image(rgb, width, height)
}

fn ycbcr_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;
    let clamp = |x: f32| x.round().clamp(0.0, 255.0) as u8;
    [
        clamp(y + 1.402 * v),
        clamp(y - 0.344_136 * u - 0.714_136 * v),
        clamp(y + 1.772 * u),
    ]
}

/// Replicate an 8-bit grayscale buffer into RGB.
pub fn grey_to_rgb(grey: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let pixels = (width * height) as usize;
    if grey.len() < pixels {
        return Err(FrameError::InvalidLength { expected: pixels, actual: grey.len() });
    }
    let rgb = grey[..pixels].iter().flat_map(|&g| [g, g, g]).collect();
    to_image(rgb, width, height)
}

/// Wrap a packed RGB24 buffer.
pub fn rgb24_to_rgb(buf: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let expected = (width * height * 3) as usize;
    if buf.len() < expected {
        return Err(FrameError::InvalidLength { expected, actual: buf.len() });
    }
    to_image(buf[..expected].to_vec(), width, height)
}

/// Decode one Motion-JPEG frame.
pub fn mjpeg_to_rgb(buf: &[u8]) -> Result<RgbImage, FrameError> {
    let decoded = image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg)?;
    Ok(decoded.to_rgb8())
}

fn to_image(rgb: Vec<u8>, width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let actual = rgb.len();
    RgbImage::from_raw(width, height, rgb).ok_or(FrameError::InvalidLength {
        expected: (width * height * 3) as usize,
        actual,
    })
}
