use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// How registration decides which frames to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Save a frame when the capture key is pressed.
    #[default]
    Manual,
    /// Save every frame with a face, pausing between captures.
    Automatic,
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "auto" | "automatic" => Ok(Self::Automatic),
            other => Err(format!("unknown capture mode: {other}")),
        }
    }
}

/// Application configuration.
///
/// Built from defaults, optionally overlaid with a TOML file, then with
/// `ROLLCALL_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the per-student image tree (default: `dataset`).
    pub dataset_dir: PathBuf,
    /// CSV attendance log (default: `attendance_log.csv`).
    pub log_path: PathBuf,
    /// Where generated reports are written (default: current directory).
    pub report_dir: PathBuf,
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory containing `det_10g.onnx` and `w600k_r50.onnx`.
    pub model_dir: PathBuf,
    /// Euclidean distance at or below which two encodings match.
    pub match_tolerance: f32,
    /// Frames discarded after opening the camera.
    pub warmup_frames: usize,
    /// Images captured per registration.
    pub max_images: usize,
    /// Pause after each automatic capture, in milliseconds.
    pub capture_delay_ms: u64,
    /// Default registration mode.
    pub capture_mode: CaptureMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("dataset"),
            log_path: PathBuf::from("attendance_log.csv"),
            report_dir: PathBuf::from("."),
            camera_device: "/dev/video0".to_string(),
            model_dir: default_model_dir(),
            match_tolerance: rollcall_core::DEFAULT_TOLERANCE,
            warmup_frames: 4,
            max_images: 10,
            capture_delay_ms: 500,
            capture_mode: CaptureMode::Manual,
        }
    }
}

impl Config {
    /// Load configuration: defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Overlay `ROLLCALL_*` variables resolved through `lookup`.
    ///
    /// Values that fail to parse leave the current setting in place.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("ROLLCALL_DATASET_DIR") {
            self.dataset_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ROLLCALL_LOG_PATH") {
            self.log_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("ROLLCALL_REPORT_DIR") {
            self.report_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ROLLCALL_CAMERA_DEVICE") {
            self.camera_device = v;
        }
        if let Some(v) = lookup("ROLLCALL_MODEL_DIR") {
            self.model_dir = PathBuf::from(v);
        }
        override_parsed(&lookup, "ROLLCALL_MATCH_TOLERANCE", &mut self.match_tolerance);
        override_parsed(&lookup, "ROLLCALL_WARMUP_FRAMES", &mut self.warmup_frames);
        override_parsed(&lookup, "ROLLCALL_MAX_IMAGES", &mut self.max_images);
        override_parsed(&lookup, "ROLLCALL_CAPTURE_DELAY_MS", &mut self.capture_delay_ms);
        override_parsed(&lookup, "ROLLCALL_CAPTURE_MODE", &mut self.capture_mode);
    }

    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }

    /// Path to the SCRFD detection model.
    pub fn detector_model_path(&self) -> PathBuf {
        self.model_dir.join("det_10g.onnx")
    }

    /// Path to the ArcFace encoding model.
    pub fn encoder_model_path(&self) -> PathBuf {
        self.model_dir.join("w600k_r50.onnx")
    }
}

fn override_parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(v) => *slot = v,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring unparsable override"),
    }
}

/// `$XDG_DATA_HOME/rollcall/models`, falling back to `~/.local/share`.
fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("rollcall/models")
}
