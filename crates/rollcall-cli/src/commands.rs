//! Subcommand bodies and the interactive menu.

use anyhow::{Context, Result};
use rollcall_attendance::{
    generate_report, load_report, AttendanceLog, AttendanceMarker, AttendanceSession, CaptureMode, Config, Dataset,
    DatasetError, PdfReportRenderer, Registration, ReportError, StudentName, SystemClock, TextReportRenderer,
};
use rollcall_core::{ArcFaceEncoder, EuclideanComparator, ScrfdDetector};
use rollcall_hw::{Camera, PreviewWindow};
use std::io::{BufRead, Write};

fn open_camera(config: &Config) -> Result<Camera> {
    let camera = Camera::open(&config.camera_device).context("could not open webcam")?;
    camera.warm_up(config.warmup_frames);
    Ok(camera)
}

fn load_detector(config: &Config) -> Result<ScrfdDetector> {
    let path = config.detector_model_path();
    ScrfdDetector::load(&path).with_context(|| format!("loading detector from {}", path.display()))
}

fn load_encoder(config: &Config) -> Result<ArcFaceEncoder> {
    let path = config.encoder_model_path();
    ArcFaceEncoder::load(&path).with_context(|| format!("loading encoder from {}", path.display()))
}

pub fn register(config: &Config, name: &str, auto: bool, max_images: Option<usize>) -> Result<()> {
    let registration = Registration {
        student: StudentName::parse(name)?,
        mode: if auto { CaptureMode::Automatic } else { config.capture_mode },
        max_images: max_images.unwrap_or(config.max_images),
        capture_delay: config.capture_delay(),
    };
    let dataset = Dataset::new(&config.dataset_dir);
    let mut detector = load_detector(config)?;

    println!("Starting registration for {}...", registration.student);
    match registration.mode {
        CaptureMode::Manual => {
            println!("Press SPACE to capture an image (max {} images)", registration.max_images);
            println!("Press 'q' to quit");
        }
        CaptureMode::Automatic => println!(
            "Capturing {} images automatically. Please look at the camera.",
            registration.max_images
        ),
    }

    let mut camera = open_camera(config)?;
    let mut window = PreviewWindow::open("Registration", camera.width, camera.height)?;
    let summary = registration.run(&dataset, &mut detector, &mut camera, &mut window, &SystemClock)?;

    if summary.cancelled {
        println!("Registration cancelled by user.");
    }
    println!(
        "Registration completed for {}. {} images captured.",
        summary.student,
        summary.saved.len()
    );
    Ok(())
}

pub fn attend(config: &Config) -> Result<()> {
    let mut detector = load_detector(config)?;
    let mut encoder = load_encoder(config)?;

    println!("Loading dataset...");
    let snapshot = match Dataset::new(&config.dataset_dir).load(&mut detector, &mut encoder) {
        Ok(s) => s,
        Err(DatasetError::NotReady(_)) => {
            println!("Cannot start attendance system. No students registered.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    println!("Dataset loaded successfully with {} students", snapshot.len());

    let mut log = AttendanceLog::open_or_init(&config.log_path)?;
    let comparator = EuclideanComparator {
        tolerance: config.match_tolerance,
    };
    let marker = AttendanceMarker::new(SystemClock);

    let mut camera = open_camera(config)?;
    let mut window = PreviewWindow::open("Attendance", camera.width, camera.height)?;

    println!("Starting attendance system...");
    println!("Press 'q' to quit");
    let summary = AttendanceSession::new(&snapshot, &comparator, marker, &mut log)?.run(
        &mut detector,
        &mut encoder,
        &mut camera,
        &mut window,
    )?;

    for entry in &summary.marks {
        println!("Attendance marked for {} at {}", entry.name, entry.time);
    }
    println!("Attendance system closed.");
    Ok(())
}

pub fn report(config: &Config, stdout: bool) -> Result<()> {
    let log = AttendanceLog::at(&config.log_path);
    let result = if stdout {
        load_report(&log).map(|r| print!("{}", TextReportRenderer::format(&r)))
    } else {
        generate_report(&log, &config.report_dir, chrono::Local::now(), &PdfReportRenderer)
            .map(|path| println!("Attendance report generated: {}", path.display()))
    };

    match result {
        Err(ReportError::NoRecords) => {
            println!("{}", ReportError::NoRecords);
            Ok(())
        }
        other => Ok(other?),
    }
}

pub fn students(config: &Config, json: bool) -> Result<()> {
    let students = Dataset::new(&config.dataset_dir).students()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&students)?);
        return Ok(());
    }
    if students.is_empty() {
        println!("No students registered");
    }
    for s in &students {
        println!("{:<24} {} images", s.name, s.images);
    }
    Ok(())
}

pub fn devices() {
    let devices = Camera::list_devices();
    if devices.is_empty() {
        println!("No video capture devices found");
    }
    for d in devices {
        println!("{}  {} ({}, {})", d.path, d.name, d.driver, d.bus);
    }
}

fn prompt(label: &str) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Loop over the numbered menu until the user exits or stdin closes.
/// Errors are printed and the menu is shown again.
pub fn menu(config: &Config) -> Result<()> {
    loop {
        println!("\n===== Facial Recognition Attendance System =====");
        println!("1. Register New Student");
        println!("2. Start Attendance System");
        println!("3. Generate Attendance Report");
        println!("4. Exit");

        let Some(choice) = prompt("\nEnter your choice (1-4): ")? else {
            return Ok(());
        };
        let result = match choice.as_str() {
            "1" => match prompt("Enter student name: ")? {
                Some(name) => register(config, &name, false, None),
                None => return Ok(()),
            },
            "2" => attend(config),
            "3" => report(config, false),
            "4" => {
                println!("Exiting...");
                return Ok(());
            }
            _ => {
                println!("Invalid choice. Please try again.");
                continue;
            }
        };

        if let Err(e) = result {
            tracing::error!(error = %e, "operation failed");
            println!("Error: {e:#}");
        }
    }
}
