//! HAInstaller logging
//!
//! Writes every message to a timestamped log file and mirrors it to the
//! console, with a short run header up front.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

static LOGGER: OnceLock<Arc<Mutex<Logger>>> = OnceLock::new();

// ============================================================================
// Log Levels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Download,
    Patch,
    Warning,
    Error,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Download => "[DOWNLOAD]",
            LogLevel::Patch => "[PATCH]",
            LogLevel::Warning => "[WARNING]",
            LogLevel::Error => "[ERROR]",
        }
    }
}

// ============================================================================
// Logger
// ============================================================================

pub struct Logger {
    log_file: Option<File>,
}

impl Logger {
    pub fn new() -> Self {
        let log_dir = log_dir();
        let _ = fs::create_dir_all(&log_dir);

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("hainstaller_{}.log", timestamp));

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .ok();

        let mut logger = Self { log_file };
        logger.write_raw(&run_header());
        logger
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.log_file {
            let _ = writeln!(file, "{}", msg);
            let _ = file.flush();
        }
        println!("{}", msg);
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        let formatted = format!("[{}] {} {}", timestamp, level.prefix(), message);
        self.write_raw(&formatted);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hainstaller")
        .join("logs")
}

fn run_header() -> String {
    format!(
        "TeamSpen's Hammer Addons Installer v{} - {} ({})",
        env!("CARGO_PKG_VERSION"),
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        std::env::consts::OS,
    )
}

// ============================================================================
// Global Logger Access
// ============================================================================

/// Initialize the global logger (call once at startup)
pub fn init_logger() {
    LOGGER.get_or_init(|| Arc::new(Mutex::new(Logger::new())));
}

fn logger() -> Arc<Mutex<Logger>> {
    LOGGER
        .get_or_init(|| Arc::new(Mutex::new(Logger::new())))
        .clone()
}

// ============================================================================
// Convenience Logging Functions
// ============================================================================

pub fn log_info(message: &str) {
    if let Ok(mut log) = logger().lock() {
        log.log(LogLevel::Info, message);
    }
}

pub fn log_download(message: &str) {
    if let Ok(mut log) = logger().lock() {
        log.log(LogLevel::Download, message);
    }
}

pub fn log_patch(message: &str) {
    if let Ok(mut log) = logger().lock() {
        log.log(LogLevel::Patch, message);
    }
}

pub fn log_warning(message: &str) {
    if let Ok(mut log) = logger().lock() {
        log.log(LogLevel::Warning, message);
    }
}

pub fn log_error(message: &str) {
    if let Ok(mut log) = logger().lock() {
        log.log(LogLevel::Error, message);
    }
}
