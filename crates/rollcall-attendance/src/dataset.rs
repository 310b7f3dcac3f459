//! Encoding store: the `dataset/<student>/<images>` tree and the session
//! snapshot of reference encodings loaded from it.

use image::RgbImage;
use rollcall_core::{Encoding, FaceEncoder, FaceLocator};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("no registered students with a usable face in {0}")]
    NotReady(PathBuf),
    #[error("invalid student name {0:?}")]
    InvalidName(String),
    #[error("dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A student name that is safe to use as a directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentName(String);

impl StudentName {
    pub fn parse(raw: &str) -> Result<Self, DatasetError> {
        let name = raw.trim();
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(&['/', '\\'][..])
            || name.chars().any(char::is_control);
        if invalid {
            return Err(DatasetError::InvalidName(raw.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One student's reference encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentReference {
    pub name: String,
    pub encoding: Encoding,
    /// Image the encoding was taken from.
    pub source: PathBuf,
}

/// Registered student as seen on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub name: String,
    pub images: usize,
}

/// Reference encodings loaded once at the start of an attendance session.
///
/// Never re-scanned while the session runs; students registered meanwhile
/// appear in the next session.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    students: Vec<StudentReference>,
    encodings: Vec<Encoding>,
}

impl DatasetSnapshot {
    pub fn new(students: Vec<StudentReference>) -> Self {
        let encodings = students.iter().map(|s| s.encoding.clone()).collect();
        Self { students, encodings }
    }

    pub fn students(&self) -> &[StudentReference] {
        &self.students
    }

    /// Reference encodings, index-aligned with [`students`](Self::students).
    pub fn encodings(&self) -> &[Encoding] {
        &self.encodings
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.students.get(index).map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

/// The dataset directory tree.
#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
}

impl Dataset {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the dataset root if it does not exist.
    pub fn ensure_root(&self) -> Result<(), DatasetError> {
        if !self.root.is_dir() {
            std::fs::create_dir_all(&self.root).map_err(|e| self.io_error(&self.root, e))?;
            tracing::info!(path = %self.root.display(), "created dataset directory");
        }
        Ok(())
    }

    pub fn student_dir(&self, name: &StudentName) -> PathBuf {
        self.root.join(name.as_str())
    }

    /// Create (if needed) and return the directory for `name`.
    pub fn ensure_student_dir(&self, name: &StudentName) -> Result<PathBuf, DatasetError> {
        let dir = self.student_dir(name);
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(&dir, e))?;
        Ok(dir)
    }

    /// Registered students and how many images each has. A missing root has none.
    pub fn students(&self) -> Result<Vec<StudentSummary>, DatasetError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        self.student_dirs()?
            .into_iter()
            .map(|(name, dir)| {
                let images = self.image_files(&dir)?.len();
                Ok(StudentSummary { name, images })
            })
            .collect()
    }

    /// Build the session snapshot: one reference encoding per student.
    ///
    /// For each student directory the first image (by name) that decodes and
    /// contains a face is used. Students without one are skipped with a
    /// warning. Fails with [`DatasetError::NotReady`] if nobody is usable.
    pub fn load(
        &self,
        locator: &mut dyn FaceLocator,
        encoder: &mut dyn FaceEncoder,
    ) -> Result<DatasetSnapshot, DatasetError> {
        if !self.root.is_dir() {
            tracing::warn!(path = %self.root.display(), "dataset directory missing");
            return Err(DatasetError::NotReady(self.root.clone()));
        }

        let mut students = Vec::new();
        for (name, dir) in self.student_dirs()? {
            let images = match self.image_files(&dir) {
                Ok(images) => images,
                Err(e) => {
                    tracing::warn!(student = %name, error = %e, "cannot read student directory");
                    continue;
                }
            };
            if images.is_empty() {
                tracing::warn!(student = %name, "no images found for student");
                continue;
            }

            match first_encoding(&images, locator, encoder) {
                Some((source, encoding)) => {
                    tracing::debug!(student = %name, image = %source.display(), "reference encoding loaded");
                    students.push(StudentReference { name, encoding, source });
                }
                None => tracing::warn!(student = %name, "no face detected in any image"),
            }
        }

        if students.is_empty() {
            return Err(DatasetError::NotReady(self.root.clone()));
        }
        tracing::info!(students = students.len(), "dataset loaded");
        Ok(DatasetSnapshot::new(students))
    }

    /// Student subdirectories as `(name, path)`, sorted by name.
    fn student_dirs(&self) -> Result<Vec<(String, PathBuf)>, DatasetError> {
        let mut dirs: Vec<(String, PathBuf)> = self
            .list(&self.root)?
            .into_iter()
            .filter(|p| p.is_dir())
            .filter_map(|p| {
                let Some(name) = p.file_name()?.to_str().map(str::to_string) else {
                    tracing::warn!(path = %p.display(), "skipping student directory with non-UTF-8 name");
                    return None;
                };
                Some((name, p))
            })
            .collect();
        dirs.sort();
        Ok(dirs)
    }

    /// Image files directly inside `dir`, sorted by name.
    fn image_files(&self, dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
        let mut files: Vec<PathBuf> = self
            .list(dir)?
            .into_iter()
            .filter(|p| p.is_file() && is_image_file(p))
            .collect();
        files.sort();
        Ok(files)
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
        let entries = std::fs::read_dir(dir).map_err(|e| self.io_error(dir, e))?;
        entries
            .map(|entry| entry.map(|e| e.path()).map_err(|e| self.io_error(dir, e)))
            .collect()
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> DatasetError {
        DatasetError::Io { path: path.to_path_buf(), source }
    }
}

/// `.jpg`, `.jpeg` or `.png`, in any case.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

fn first_encoding(
    images: &[PathBuf],
    locator: &mut dyn FaceLocator,
    encoder: &mut dyn FaceEncoder,
) -> Option<(PathBuf, Encoding)> {
    images.iter().find_map(|path| {
        let image = match decode(path) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(image = %path.display(), error = %e, "skipping unreadable image");
                return None;
            }
        };
        match encode_first_face(&image, locator, encoder) {
            Ok(Some(encoding)) => Some((path.clone(), encoding)),
            Ok(None) => {
                tracing::warn!(image = %path.display(), "no face detected");
                None
            }
            Err(e) => {
                tracing::warn!(image = %path.display(), error = %e, "face analysis failed");
                None
            }
        }
    })
}

fn decode(path: &Path) -> Result<RgbImage, image::ImageError> {
    Ok(image::open(path)?.to_rgb8())
}

fn encode_first_face(
    image: &RgbImage,
    locator: &mut dyn FaceLocator,
    encoder: &mut dyn FaceEncoder,
) -> Result<Option<Encoding>, rollcall_core::VisionError> {
    let faces = locator.locate(image)?;
    let Some(face) = faces.first() else {
        return Ok(None);
    };
    Ok(encoder.encode(image, std::slice::from_ref(face))?.into_iter().next())
}
