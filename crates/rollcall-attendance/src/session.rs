//! Live attendance: one blocking loop of capture → detect → encode →
//! identify → cooldown check → preview → key poll.

use crate::attendance_log::{LogEntry, LogError, LogSink};
use crate::clock::Clock;
use crate::cooldown::{AttendanceMarker, MarkOutcome};
use crate::dataset::DatasetSnapshot;
use crate::matcher::{identify, Identification};
use image::RgbImage;
use rollcall_core::{BoundingBox, Comparator, FaceEncoder, FaceLocator, VisionError};
use rollcall_hw::{Color, Control, FrameSource, Overlay, Viewer, ViewerError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("cannot start attendance: no students registered")]
    NotReady,
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    Viewer(#[from] ViewerError),
    #[error(transparent)]
    Vision(#[from] VisionError),
}

/// What happened to one detected face.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceStatus {
    Marked(LogEntry),
    AlreadyMarked,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceVerdict {
    pub face: BoundingBox,
    pub identification: Identification,
    pub status: FaceStatus,
}

impl FaceVerdict {
    pub fn label(&self) -> String {
        let status = match self.status {
            FaceStatus::Marked(_) => "Marked",
            FaceStatus::AlreadyMarked => "Already Marked",
            FaceStatus::Unknown => "Unknown",
        };
        format!("{} - {status}", self.identification.label())
    }

    pub fn overlay(&self) -> Overlay {
        let color = match self.status {
            FaceStatus::Marked(_) => Color::Green,
            _ => Color::Red,
        };
        face_overlay(&self.face, color, self.label())
    }
}

pub(crate) fn face_overlay(face: &BoundingBox, color: Color, label: String) -> Overlay {
    Overlay {
        left: face.x.round() as i32,
        top: face.y.round() as i32,
        right: (face.x + face.width).round() as i32,
        bottom: (face.y + face.height).round() as i32,
        color,
        label,
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    FrameUnavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub frames: usize,
    pub marks: Vec<LogEntry>,
    pub ended_by: SessionEnd,
}

pub struct AttendanceSession<'a, C: Clock> {
    snapshot: &'a DatasetSnapshot,
    comparator: &'a dyn Comparator,
    marker: AttendanceMarker<C>,
    sink: &'a mut dyn LogSink,
}

impl<'a, C: Clock> AttendanceSession<'a, C> {
    /// Refuses to start with an empty snapshot.
    pub fn new(
        snapshot: &'a DatasetSnapshot,
        comparator: &'a dyn Comparator,
        marker: AttendanceMarker<C>,
        sink: &'a mut dyn LogSink,
    ) -> Result<Self, SessionError> {
        if snapshot.is_empty() {
            return Err(SessionError::NotReady);
        }
        Ok(Self { snapshot, comparator, marker, sink })
    }

    /// Identify and, where allowed, mark every face in one frame.
    pub fn process_frame(
        &mut self,
        image: &RgbImage,
        locator: &mut dyn FaceLocator,
        encoder: &mut dyn FaceEncoder,
    ) -> Result<Vec<FaceVerdict>, SessionError> {
        let faces = locator.locate(image)?;
        if faces.is_empty() {
            return Ok(Vec::new());
        }
        let encodings = encoder.encode(image, &faces)?;

        let mut verdicts = Vec::with_capacity(faces.len());
        for (face, encoding) in faces.into_iter().zip(encodings) {
            let identification = identify(self.comparator, self.snapshot, &encoding);
            let status = match &identification {
                Identification::Known { name, .. } => match self.marker.mark(name, &mut *self.sink)? {
                    MarkOutcome::Marked(entry) => FaceStatus::Marked(entry),
                    MarkOutcome::AlreadyMarked { .. } => FaceStatus::AlreadyMarked,
                },
                Identification::Unknown => FaceStatus::Unknown,
            };
            verdicts.push(FaceVerdict { face, identification, status });
        }
        Ok(verdicts)
    }

    /// Run until the quit control or a failed frame grab.
    ///
    /// Frames whose analysis fails are skipped; a log write failure ends
    /// the session with an error.
    pub fn run(
        &mut self,
        locator: &mut dyn FaceLocator,
        encoder: &mut dyn FaceEncoder,
        source: &mut dyn FrameSource,
        viewer: &mut dyn Viewer,
    ) -> Result<SessionSummary, SessionError> {
        tracing::info!(students = self.snapshot.len(), "attendance session started");
        let status = format!("{} students loaded | q to quit", self.snapshot.len());
        let mut frames = 0usize;
        let mut marks = Vec::new();

        let ended_by = loop {
            let frame = match source.acquire() {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to grab frame");
                    break SessionEnd::FrameUnavailable;
                }
            };
            frames += 1;

            let verdicts = match self.process_frame(&frame.image, locator, encoder) {
                Ok(v) => v,
                Err(SessionError::Vision(e)) => {
                    tracing::warn!(error = %e, frame = frame.sequence, "skipping frame");
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

            let overlays: Vec<Overlay> = verdicts.iter().map(FaceVerdict::overlay).collect();
            for verdict in verdicts {
                if let FaceStatus::Marked(entry) = verdict.status {
                    marks.push(entry);
                }
            }

            viewer.present(&frame.image, &overlays, &status)?;
            if viewer.poll() == Some(Control::Quit) {
                break SessionEnd::Quit;
            }
        };

        tracing::info!(frames, marks = marks.len(), ?ended_by, "attendance session closed");
        Ok(SessionSummary { frames, marks, ended_by })
    }
}
