use chrono::{Local, TimeZone};
use rollcall_attendance::{
    generate_report, load_report, AttendanceLog, AttendanceMarker, ManualClock, PdfReportRenderer, ReportError,
    TextReportRenderer,
};

fn write_log(path: &std::path::Path, rows: &str) {
    std::fs::write(path, format!("Name,Date,Time\n{rows}")).unwrap();
}

#[test]
fn test_report_keeps_first_mark_per_day() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attendance_log.csv");
    write_log(
        &path,
        "Alice,2024-01-01,09:00:00\nAlice,2024-01-01,09:05:00\nBob,2024-01-01,09:10:00\n",
    );

    let report = load_report(&AttendanceLog::at(&path)).unwrap();
    assert_eq!(
        TextReportRenderer::format(&report),
        "Attendance Report\n\nDate: 2024-01-01\nName   Time\nAlice  09:00:00\nBob    09:10:00\n"
    );
}

#[test]
fn test_generate_pdf_from_marked_log() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("attendance_log.csv");
    let mut log = AttendanceLog::open_or_init(&log_path).unwrap();

    let clock = ManualClock::starting_at(Local.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
    let mut marker = AttendanceMarker::new(clock.clone());
    marker.mark("Bob", &mut log).unwrap();
    marker.mark("Alice", &mut log).unwrap();
    clock.advance(chrono::TimeDelta::days(1));
    marker.mark("Alice", &mut log).unwrap();

    let out_dir = dir.path().join("reports");
    let generated_at = Local.with_ymd_and_hms(2024, 1, 2, 17, 30, 0).unwrap();
    let written = generate_report(&log, &out_dir, generated_at, &PdfReportRenderer).unwrap();

    assert_eq!(written, out_dir.join("attendance_report_20240102_173000.pdf"));
    let bytes = std::fs::read(&written).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let report = load_report(&log).unwrap();
    let dates: Vec<_> = report.sections.iter().map(|s| s.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-01-01", "2024-01-02"]);
    let first_day: Vec<_> = report.sections[0].rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(first_day, vec!["Alice", "Bob"]);
}

#[test]
fn test_no_records_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("reports");
    let now = Local.with_ymd_and_hms(2024, 1, 2, 17, 30, 0).unwrap();

    let absent = AttendanceLog::at(dir.path().join("missing.csv"));
    let err = generate_report(&absent, &out_dir, now, &PdfReportRenderer).unwrap_err();
    assert!(matches!(err, ReportError::NoRecords));
    assert_eq!(err.to_string(), "No attendance records found");

    let header_only = AttendanceLog::open_or_init(dir.path().join("log.csv")).unwrap();
    assert!(matches!(
        generate_report(&header_only, &out_dir, now, &PdfReportRenderer),
        Err(ReportError::NoRecords)
    ));
    assert!(!out_dir.exists());
}

#[test]
fn test_malformed_rows_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attendance_log.csv");
    write_log(&path, "Alice,2024-01-01,09:00:00\ngarbage\nBob,2024-01-01,09:10:00\n");

    let report = load_report(&AttendanceLog::at(&path)).unwrap();
    assert_eq!(report.sections[0].rows.len(), 2);
}
