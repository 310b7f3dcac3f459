//! Append-only CSV attendance log: `Name,Date,Time`.
//!
//! Every append opens the file, writes one row and flushes, so a row is
//! on disk once `append` returns. There is no locking; one writer at a
//! time is assumed.

use chrono::{DateTime, Local};
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const LOG_HEADER: [&str; 3] = ["Name", "Date", "Time"];
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Error, Debug)]
pub enum LogError {
    #[error("attendance log {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("attendance log {path}: {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
}

/// One row of the log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Time")]
    pub time: String,
}

impl LogEntry {
    pub fn at(name: &str, when: DateTime<Local>) -> Self {
        Self {
            name: name.to_string(),
            date: when.format(DATE_FORMAT).to_string(),
            time: when.format(TIME_FORMAT).to_string(),
        }
    }
}

/// Destination for accepted marks.
pub trait LogSink {
    fn append(&mut self, entry: &LogEntry) -> Result<(), LogError>;
}

impl LogSink for Vec<LogEntry> {
    fn append(&mut self, entry: &LogEntry) -> Result<(), LogError> {
        self.push(entry.clone());
        Ok(())
    }
}

/// The on-disk log file.
#[derive(Debug, Clone)]
pub struct AttendanceLog {
    path: PathBuf,
}

impl AttendanceLog {
    /// Refer to the log at `path` without touching the filesystem.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open the log, writing the header if the file is absent or empty.
    pub fn open_or_init(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let log = Self::at(path);
        let empty = match std::fs::metadata(&log.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(source) => return Err(log.io_error(source)),
        };
        if empty {
            if let Some(parent) = log.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| log.io_error(e))?;
            }
            let mut writer = csv::Writer::from_path(&log.path).map_err(|e| log.csv_error(e))?;
            writer.write_record(LOG_HEADER).map_err(|e| log.csv_error(e))?;
            writer.flush().map_err(|e| log.io_error(e))?;
            tracing::info!(path = %log.path.display(), "created attendance log");
        }
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the file is missing or has no bytes.
    pub fn is_absent_or_empty(&self) -> bool {
        std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true)
    }

    /// Read every well-formed row in append order. Malformed rows are skipped.
    pub fn entries(&self) -> Result<Vec<LogEntry>, LogError> {
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

        let mut entries = Vec::new();
        for (i, row) in reader.deserialize::<LogEntry>().enumerate() {
            match row {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(row = i + 2, error = %e, "skipping malformed log row"),
            }
        }
        Ok(entries)
    }

    fn io_error(&self, source: std::io::Error) -> LogError {
        LogError::Io { path: self.path.clone(), source }
    }

    fn csv_error(&self, source: csv::Error) -> LogError {
        LogError::Csv { path: self.path.clone(), source }
    }
}

impl LogSink for AttendanceLog {
    fn append(&mut self, entry: &LogEntry) -> Result<(), LogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record([&entry.name, &entry.date, &entry.time])
            .map_err(|e| self.csv_error(e))?;
        let mut file = writer.into_inner().map_err(|e| self.io_error(e.into_error()))?;
        file.flush().map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_formatting() {
        let when = Local.with_ymd_and_hms(2024, 3, 7, 8, 5, 9).unwrap();
        let entry = LogEntry::at("Alice", when);
        assert_eq!(entry.date, "2024-03-07");
        assert_eq!(entry.time, "08:05:09");
    }

    #[test]
    fn test_init_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance_log.csv");

        let mut log = AttendanceLog::open_or_init(&path).unwrap();
        log.append(&LogEntry { name: "Alice".into(), date: "2024-01-01".into(), time: "09:00:00".into() })
            .unwrap();
        AttendanceLog::open_or_init(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Name,Date,Time\nAlice,2024-01-01,09:00:00\n");
    }

    #[test]
    fn test_init_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/2024/attendance.csv");
        let log = AttendanceLog::open_or_init(&path).unwrap();
        assert!(!log.is_absent_or_empty());
    }

    #[test]
    fn test_entries_in_append_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = AttendanceLog::open_or_init(dir.path().join("log.csv")).unwrap();
        for (name, time) in [("Bob", "10:00:00"), ("Alice", "09:00:00")] {
            log.append(&LogEntry { name: name.into(), date: "2024-01-01".into(), time: time.into() })
                .unwrap();
        }
        let names: Vec<_> = log.entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_names_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = AttendanceLog::open_or_init(dir.path().join("log.csv")).unwrap();
        let entry = LogEntry { name: "Doe, Jane".into(), date: "2024-01-01".into(), time: "09:00:00".into() };
        log.append(&entry).unwrap();
        assert_eq!(log.entries().unwrap(), vec![entry]);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "Name,Date,Time\nAlice,2024-01-01,09:00:00\ngarbage\nBob,2024-01-01,09:10:00\n")
            .unwrap();
        let entries = AttendanceLog::at(&path).entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name, "Bob");
    }

    #[test]
    fn test_absent_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = AttendanceLog::at(dir.path().join("missing.csv"));
        assert!(log.is_absent_or_empty());
        assert!(matches!(log.entries(), Err(LogError::Io { .. })));
    }
}
