//! rollcall-core — Face detection, encoding and comparison.
//!
//! SCRFD locates faces and ArcFace turns each located face into a
//! fixed-length encoding, both through ONNX Runtime on the CPU. Callers
//! consume them through the [`FaceLocator`] and [`FaceEncoder`] traits so
//! that sessions can run against fakes in tests.

pub mod alignment;
pub mod compare;
pub mod detector;
pub mod encoder;
pub mod types;
pub mod vision;

pub use compare::{Comparator, Comparison, EuclideanComparator, DEFAULT_TOLERANCE};
pub use detector::ScrfdDetector;
pub use encoder::ArcFaceEncoder;
pub use types::{BoundingBox, Encoding};
pub use vision::{FaceEncoder, FaceLocator, VisionError};
