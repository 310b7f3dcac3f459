use anyhow::Result;
use clap::{Parser, Subcommand};
use rollcall_attendance::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "rollcall", about = "Facial recognition attendance")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Without a subcommand an interactive menu is shown
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture face images for a new student
    Register {
        /// Student name; also the dataset directory name
        #[arg(short, long)]
        name: String,
        /// Capture automatically instead of waiting for SPACE
        #[arg(long)]
        auto: bool,
        /// Number of images to capture
        #[arg(long)]
        max_images: Option<usize>,
    },
    /// Recognize faces from the webcam and mark attendance
    Attend,
    /// Generate a PDF attendance report from the log
    Report {
        /// Print the report as text instead of writing a PDF
        #[arg(long)]
        stdout: bool,
    },
    /// List registered students
    Students {
        #[arg(long)]
        json: bool,
    },
    /// List video capture devices
    Devices,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Some(Commands::Register { name, auto, max_images }) => {
            commands::register(&config, &name, auto, max_images)?;
        }
        Some(Commands::Attend) => commands::attend(&config)?,
        Some(Commands::Report { stdout }) => commands::report(&config, stdout)?,
        Some(Commands::Students { json }) => commands::students(&config, json)?,
        Some(Commands::Devices) => commands::devices(),
        None => commands::menu(&config)?,
    }

    Ok(())
}
