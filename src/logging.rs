/// Structured logging for the wastewater monitoring service
///
/// Provides context-rich logging with device identifiers, timestamps,
/// and severity levels. Supports both console output and file-based
/// logging for daemon operations.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Log Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    Feed,
    Monitor,
    Database,
    Push,
    Email,
    System,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::Feed => write!(f, "FEED"),
            LogSource::Monitor => write!(f, "MON"),
            LogSource::Database => write!(f, "DB"),
            LogSource::Push => write!(f, "PUSH"),
            LogSource::Email => write!(f, "EMAIL"),
            LogSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - device may be offline, decommissioned, or in maintenance
    Expected,
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        *LOGGER.lock().unwrap() = Some(logger);
    }

    /// Log a message with the global logger
    fn log(&self, level: LogLevel, source: &LogSource, device_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        // Format the log entry
        let device_part = device_id.map(|d| format!(" [{}]", d)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, source, device_part, message
        );

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, device_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, device_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(source: LogSource, device_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Info, &source, device_id, message);
    }
}

/// Log a warning message
pub fn warn(source: LogSource, device_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Warning, &source, device_id, message);
    }
}

/// Log an error message
pub fn error(source: LogSource, device_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Error, &source, device_id, message);
    }
}

/// Log a debug message
pub fn debug(source: LogSource, device_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Debug, &source, device_id, message);
    }
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a telemetry feed failure based on the error message
pub fn classify_feed_failure(_device_id: &str, error_message: &str) -> FailureType {
    // No data for a device often means the sensor is powered down or the
    // uplink dropped; known seasonal/maintenance outages land here too.
    if error_message.contains("Device not found") || error_message.contains("No data") {
        FailureType::Unknown
    }
    // HTTP errors might indicate service issues upstream
    else if error_message.contains("HTTP error") {
        FailureType::Unexpected
    }
    // Parse errors suggest telemetry schema changes or bugs
    else if error_message.contains("Parse error") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

/// Classify a notification transport failure
pub fn classify_transport_failure(error_message: &str) -> FailureType {
    if error_message.contains("HTTP") || error_message.contains("timeout") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a feed failure with automatic classification
pub fn log_feed_failure(device_id: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_feed_failure(device_id, &error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(LogSource::Feed, Some(device_id), &message),
        FailureType::Unexpected => error(LogSource::Feed, Some(device_id), &message),
        FailureType::Unknown => warn(LogSource::Feed, Some(device_id), &message),
    }
}

/// Log a push/email transport failure with classification
pub fn log_transport_failure(source: LogSource, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_transport_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Unexpected => error(source, None, &message),
        _ => warn(source, None, &message),
    }
}

// ---------------------------------------------------------------------------
// Dispatch Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a notification dispatch run
pub fn log_dispatch_summary(source: LogSource, total: usize, successful: usize, failed: usize) {
    let message = format!(
        "Dispatch complete: {}/{} successful, {} failed",
        successful, total, failed
    );

    if failed == 0 {
        info(source, None, &message);
    } else if successful == 0 {
        error(source, None, &message);
    } else {
        warn(source, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_feed_failure_classification() {
        let missing = "Device not found in feed: RPi001";
        assert_eq!(classify_feed_failure("RPi001", missing), FailureType::Unknown);

        let http = "HTTP error: 500";
        assert_eq!(classify_feed_failure("RPi001", http), FailureType::Unexpected);

        let parse = "Parse error: missing field `Timestamp`";
        assert_eq!(classify_feed_failure("RPi001", parse), FailureType::Unexpected);
    }

    #[test]
    fn test_transport_failure_classification() {
        assert_eq!(classify_transport_failure("HTTP error: 503"), FailureType::Unexpected);
        assert_eq!(classify_transport_failure("token rejected"), FailureType::Unknown);
    }
}
