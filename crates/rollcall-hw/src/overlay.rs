//! Rectangle overlays drawn onto a 0RGB preview buffer.

/// Overlay colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Red,
}

impl Color {
    pub fn to_0rgb(self) -> u32 {
        match self {
            Color::Green => 0x00_00_FF_00,
            Color::Red => 0x00_FF_00_00,
        }
    }
}

/// A labelled box in frame pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub color: Color,
    pub label: String,
}

const BORDER: i32 = 2;

/// Pack an RGB image into the 0RGB `u32` layout the preview window expects.
pub fn pack_0rgb(image: &image::RgbImage) -> Vec<u32> {
    image
        .pixels()
        .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect()
}

/// Draw the outline of each overlay into `buffer`, clipping at the edges.
pub fn draw(buffer: &mut [u32], width: usize, height: usize, overlays: &[Overlay]) {
    for o in overlays {
        let color = o.color.to_0rgb();
        for t in 0..BORDER {
            hline(buffer, width, height, o.left, o.right, o.top + t, color);
            hline(buffer, width, height, o.left, o.right, o.bottom - t, color);
            vline(buffer, width, height, o.left + t, o.top, o.bottom, color);
            vline(buffer, width, height, o.right - t, o.top, o.bottom, color);
        }
    }
}

fn hline(buffer: &mut [u32], width: usize, height: usize, x0: i32, x1: i32, y: i32, color: u32) {
    if y < 0 || y as usize >= height {
        return;
    }
    let start = x0.max(0) as usize;
    let end = (x1.max(-1) + 1).min(width as i32).max(0) as usize;
    let row = y as usize * width;
    for x in start..end {
        buffer[row + x] = color;
    }
}

fn vline(buffer: &mut [u32], width: usize, height: usize, x: i32, y0: i32, y1: i32, color: u32) {
    if x < 0 || x as usize >= width {
        return;
    }
    let start = y0.max(0) as usize;
    let end = (y1.max(-1) + 1).min(height as i32).max(0) as usize;
    for y in start..end {
        buffer[y * width + x as usize] = color;
    }
}
