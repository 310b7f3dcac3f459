//! Registration capture: saves webcam frames of one student into the dataset.

use crate::clock::Clock;
use crate::config::CaptureMode;
use crate::dataset::{Dataset, DatasetError, StudentName};
use crate::session::face_overlay;
use rollcall_core::FaceLocator;
use rollcall_hw::{Color, Control, FrameSource, Overlay, Viewer, ViewerError};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Viewer(#[from] ViewerError),
    #[error("failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub student: StudentName,
    pub saved: Vec<PathBuf>,
    /// The quit control stopped capture before `max_images` was reached.
    pub cancelled: bool,
}

/// One registration run for one student.
#[derive(Debug, Clone)]
pub struct Registration {
    pub student: StudentName,
    pub mode: CaptureMode,
    pub max_images: usize,
    /// Pause after each automatic capture.
    pub capture_delay: Duration,
}

impl Registration {
    /// `dataset/<name>/<name>_angle<N>.jpg`, N counting from 1.
    pub fn image_path(&self, dataset: &Dataset, index: usize) -> PathBuf {
        dataset
            .student_dir(&self.student)
            .join(format!("{}_angle{}.jpg", self.student, index + 1))
    }

    fn status(&self, captured: usize) -> String {
        match self.mode {
            CaptureMode::Manual => format!("Press SPACE to capture ({captured}/{})", self.max_images),
            CaptureMode::Automatic => format!("Capturing: {captured}/{}", self.max_images),
        }
    }

    /// Capture until `max_images` frames are saved, the quit control is
    /// pressed, or a frame cannot be grabbed.
    ///
    /// Only frames with at least one detected face are saved. In manual
    /// mode the capture control must also be pressed for that frame.
    pub fn run(
        &self,
        dataset: &Dataset,
        locator: &mut dyn FaceLocator,
        source: &mut dyn FrameSource,
        viewer: &mut dyn Viewer,
        clock: &dyn Clock,
    ) -> Result<RegistrationSummary, RegistrationError> {
        dataset.ensure_root()?;
        dataset.ensure_student_dir(&self.student)?;
        tracing::info!(student = %self.student, mode = ?self.mode, max = self.max_images, "registration started");

        let mut saved = Vec::new();
        let mut cancelled = false;

        while saved.len() < self.max_images {
            let frame = match source.acquire() {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to grab frame");
                    break;
                }
            };

            let faces = locator.locate(&frame.image).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "face detection failed");
                Vec::new()
            });
            let overlays: Vec<Overlay> = faces
                .iter()
                .map(|f| face_overlay(f, Color::Green, String::new()))
                .collect();

            viewer.present(&frame.image, &overlays, &self.status(saved.len()))?;
            let control = viewer.poll();
            if control == Some(Control::Quit) {
                tracing::info!(student = %self.student, "registration cancelled by user");
                cancelled = true;
                break;
            }

            let requested = match self.mode {
                CaptureMode::Manual => control == Some(Control::Capture),
                CaptureMode::Automatic => true,
            };
            if !requested {
                continue;
            }
            if faces.is_empty() {
                if self.mode == CaptureMode::Manual {
                    tracing::info!("no face in frame, not saved");
                }
                continue;
            }

            let path = self.image_path(dataset, saved.len());
            frame.image.save(&path).map_err(|source| RegistrationError::Save {
                path: path.clone(),
                source,
            })?;
            tracing::info!(image = %path.display(), count = saved.len() + 1, max = self.max_images, "image saved");
            saved.push(path);

            if self.mode == CaptureMode::Automatic {
                clock.sleep(self.capture_delay);
            }
        }

        tracing::info!(student = %self.student, images = saved.len(), "registration completed");
        Ok(RegistrationSummary {
            student: self.student.clone(),
            saved,
            cancelled,
        })
    }
}
