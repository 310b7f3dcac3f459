//! Attendance report: log rows grouped by date, first mark per student.

use crate::attendance_log::{AttendanceLog, LogEntry, LogError};
use crate::render::ReportRenderer;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No attendance records found")]
    NoRecords,
    #[error(transparent)]
    Log(#[from] LogError),
    #[error("report {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("pdf rendering failed: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub name: String,
    pub time: String,
}

/// One table: every student seen on `date`, with their first mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSection {
    pub date: String,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub sections: Vec<DateSection>,
}

impl Report {
    /// Group entries by date, in order of first appearance. Within a date
    /// the first entry per student is kept and rows are ordered by name.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> Self {
        let mut dates: Vec<(String, BTreeMap<String, String>)> = Vec::new();

        for entry in entries {
            let pos = match dates.iter().position(|(d, _)| *d == entry.date) {
                Some(pos) => pos,
                None => {
                    dates.push((entry.date.clone(), BTreeMap::new()));
                    dates.len() - 1
                }
            };
            dates[pos].1.entry(entry.name.clone()).or_insert_with(|| entry.time.clone());
        }

        let sections = dates
            .into_iter()
            .map(|(date, students)| DateSection {
                date,
                rows: students.into_iter().map(|(name, time)| ReportRow { name, time }).collect(),
            })
            .collect();
        Self { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// `attendance_report_YYYYMMDD_HHMMSS.pdf`
pub fn report_file_name(generated_at: DateTime<Local>) -> String {
    format!("attendance_report_{}.pdf", generated_at.format("%Y%m%d_%H%M%S"))
}

/// Read the log and build its report.
///
/// An absent, empty or header-only log yields [`ReportError::NoRecords`].
pub fn load_report(log: &AttendanceLog) -> Result<Report, ReportError> {
    if log.is_absent_or_empty() {
        return Err(ReportError::NoRecords);
    }
    let entries = log.entries()?;
    let report = Report::from_entries(&entries);
    if report.is_empty() {
        return Err(ReportError::NoRecords);
    }
    Ok(report)
}

/// Build the report from `log` and render it into `out_dir`.
///
/// Returns the path written. Nothing is written when there are no records.
pub fn generate_report(
    log: &AttendanceLog,
    out_dir: &Path,
    generated_at: DateTime<Local>,
    renderer: &dyn ReportRenderer,
) -> Result<PathBuf, ReportError> {
    let report = load_report(log)?;

    std::fs::create_dir_all(out_dir).map_err(|source| ReportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let path = out_dir.join(report_file_name(generated_at));
    renderer.render(&report, &path)?;

    tracing::info!(
        path = %path.display(),
        dates = report.sections.len(),
        "attendance report generated"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(name: &str, date: &str, time: &str) -> LogEntry {
        LogEntry { name: name.into(), date: date.into(), time: time.into() }
    }

    fn row(name: &str, time: &str) -> ReportRow {
        ReportRow { name: name.into(), time: time.into() }
    }

    #[test]
    fn test_first_row_per_student_wins() {
        let entries = vec![
            entry("Alice", "2024-01-01", "09:00:00"),
            entry("Alice", "2024-01-01", "09:05:00"),
            entry("Bob", "2024-01-01", "09:10:00"),
        ];
        let report = Report::from_entries(&entries);
        assert_eq!(report.sections, vec![DateSection {
            date: "2024-01-01".into(),
            rows: vec![row("Alice", "09:00:00"), row("Bob", "09:10:00")],
        }]);
    }

    #[test]
    fn test_append_order_beats_time_of_day() {
        // An out-of-order time still loses to the earlier-appended row.
        let entries = vec![
            entry("Alice", "2024-01-01", "15:00:00"),
            entry("Alice", "2024-01-01", "08:00:00"),
        ];
        let report = Report::from_entries(&entries);
        assert_eq!(report.sections[0].rows, vec![row("Alice", "15:00:00")]);
    }

    #[test]
    fn test_dates_in_first_appearance_order() {
        let entries = vec![
            entry("Zed", "2024-01-02", "09:00:00"),
            entry("Amy", "2024-01-01", "09:00:00"),
            entry("Bea", "2024-01-02", "10:00:00"),
            entry("Zed", "2024-01-01", "11:00:00"),
        ];
        let report = Report::from_entries(&entries);
        let dates: Vec<_> = report.sections.iter().map(|s| s.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-01"]);
        assert_eq!(report.sections[0].rows, vec![row("Bea", "10:00:00"), row("Zed", "09:00:00")]);
        assert_eq!(report.sections[1].rows, vec![row("Amy", "09:00:00"), row("Zed", "11:00:00")]);
    }

    #[test]
    fn test_n_dates_by_m_students() {
        let mut entries = Vec::new();
        for day in 1..=3 {
            for repeat in 0..2 {
                for student in ["A", "B", "C", "D"] {
                    entries.push(entry(student, &format!("2024-02-0{day}"), &format!("1{repeat}:00:00")));
                }
            }
        }
        let report = Report::from_entries(&entries);
        assert_eq!(report.sections.len(), 3);
        for section in &report.sections {
            assert_eq!(section.rows.len(), 4);
            assert!(section.rows.iter().all(|r| r.time == "10:00:00"));
        }
    }

    #[test]
    fn test_report_file_name() {
        let at = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(report_file_name(at), "attendance_report_20240506_070809.pdf");
    }

    #[test]
    fn test_header_only_log_has_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let log = AttendanceLog::open_or_init(dir.path().join("log.csv")).unwrap();
        assert!(matches!(load_report(&log), Err(ReportError::NoRecords)));
        assert!(matches!(
            load_report(&AttendanceLog::at(dir.path().join("absent.csv"))),
            Err(ReportError::NoRecords)
        ));
    }
}
