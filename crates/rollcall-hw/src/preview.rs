//! Preview window via `minifb`: shows frames with overlays and polls keys.
//!
//! `minifb` has no text rendering, so the status line and the overlay
//! labels go into the window title.

use crate::overlay::{self, Overlay};
use crate::{Control, Viewer};
use image::RgbImage;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("preview window: {0}")]
    Window(#[from] minifb::Error),
}

pub struct PreviewWindow {
    window: Window,
    title: String,
    width: usize,
    height: usize,
    buffer: Vec<u32>,
}

impl PreviewWindow {
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self, ViewerError> {
        let (width, height) = (width as usize, height as usize);
        let mut window = Window::new(title, width, height, WindowOptions::default())?;
        window.set_target_fps(30);
        tracing::debug!(title, width, height, "opened preview window");
        Ok(Self {
            window,
            title: title.to_string(),
            width,
            height,
            buffer: vec![0; width * height],
        })
    }
}

impl Viewer for PreviewWindow {
    fn present(&mut self, image: &RgbImage, overlays: &[Overlay], status: &str) -> Result<(), ViewerError> {
        self.width = image.width() as usize;
        self.height = image.height() as usize;
        self.buffer = overlay::pack_0rgb(image);
        overlay::draw(&mut self.buffer, self.width, self.height, overlays);

        let mut caption = format!("{} | {status}", self.title);
        for o in overlays.iter().filter(|o| !o.label.is_empty()) {
            caption.push_str(" | ");
            caption.push_str(&o.label);
        }
        self.window.set_title(&caption);

        self.window.update_with_buffer(&self.buffer, self.width, self.height)?;
        Ok(())
    }

    fn poll(&mut self) -> Option<Control> {
        if !self.window.is_open() || self.window.is_key_pressed(Key::Q, KeyRepeat::No) {
            Some(Control::Quit)
        } else if self.window.is_key_pressed(Key::Space, KeyRepeat::No) {
            Some(Control::Capture)
        } else {
            None
        }
    }
}
