//! rollcall-attendance — Attendance engine.
//!
//! Loads a session snapshot of reference encodings from the dataset tree,
//! identifies faces in live frames, applies the per-student cooldown before
//! appending to the CSV log, and renders the log into per-date reports.
//! Registration capture lives here too, since it writes the dataset the
//! snapshot is read from.

pub mod attendance_log;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod dataset;
pub mod matcher;
pub mod registration;
pub mod render;
pub mod report;
pub mod session;

pub use attendance_log::{AttendanceLog, LogEntry, LogError, LogSink};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CaptureMode, Config, ConfigError};
pub use cooldown::{AttendanceMarker, MarkOutcome, COOLDOWN_PERIOD};
pub use dataset::{Dataset, DatasetError, DatasetSnapshot, StudentName, StudentReference, StudentSummary};
pub use matcher::{identify, Identification};
pub use registration::{Registration, RegistrationError, RegistrationSummary};
pub use render::{PdfReportRenderer, ReportRenderer, TextReportRenderer};
pub use report::{generate_report, load_report, report_file_name, DateSection, Report, ReportError, ReportRow};
pub use session::{AttendanceSession, FaceStatus, FaceVerdict, SessionEnd, SessionError, SessionSummary};
