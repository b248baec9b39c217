//! Structured logging for the station monitoring service.
//!
//! Provides context-rich logging with component and location identifiers,
//! timestamps, and severity levels. Supports both console output and
//! file-based logging for unattended runs.

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

impl LogLevel {
    /// Parses a level name as used in config files ("debug", "warn", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
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
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Engine,
    Store,
    Ingest,
    Reception,
    Config,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Engine => write!(f, "ENGINE"),
            Component::Store => write!(f, "STORE"),
            Component::Ingest => write!(f, "INGEST"),
            Component::Reception => write!(f, "RECEPTION"),
            Component::Config => write!(f, "CONFIG"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - table empty or station type not deployed
    Expected,
    /// Unexpected failure - indicates database outage or schema drift
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

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, component: Component, location_id: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let location_part = location_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, component, location_part, message)
    }

    fn log(&self, level: LogLevel, component: Component, location_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, component, location_id, message);
        let location_part = location_id.map(|s| format!(" [{}]", s)).unwrap_or_default();

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
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, location_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, location_part, message),
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

fn emit(level: LogLevel, component: Component, location_id: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, location_id, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, location_id: Option<&str>, message: &str) {
    emit(LogLevel::Info, component, location_id, message);
}

/// Log a warning message
pub fn warn(component: Component, location_id: Option<&str>, message: &str) {
    emit(LogLevel::Warning, component, location_id, message);
}

/// Log an error message
pub fn error(component: Component, location_id: Option<&str>, message: &str) {
    emit(LogLevel::Error, component, location_id, message);
}

/// Log a debug message
pub fn debug(component: Component, location_id: Option<&str>, message: &str) {
    emit(LogLevel::Debug, component, location_id, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a store failure based on the error message
pub fn classify_store_failure(error_message: &str) -> FailureType {
    if error_message.contains("does not exist") {
        // A station table that was never provisioned for this deployment
        FailureType::Expected
    } else if error_message.contains("Connection") || error_message.contains("timed out") {
        FailureType::Unexpected
    } else if error_message.contains("DATABASE_URL") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a store failure with automatic classification
pub fn log_store_failure(table: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_store_failure(&error_msg);

    let message = format!("{} on {} failed [{}]: {}", operation, table, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(Component::Store, None, &message),
        FailureType::Unexpected => error(Component::Store, None, &message),
        FailureType::Unknown => warn(Component::Store, None, &message),
    }
}

// ---------------------------------------------------------------------------
// Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a row conversion pass
pub fn log_ingest_summary(table: &str, total: usize, accepted: usize, dropped: usize) {
    let message = format!(
        "{}: {}/{} rows accepted, {} dropped",
        table, accepted, total, dropped
    );

    if dropped == 0 {
        info(Component::Ingest, None, &message);
    } else if accepted == 0 {
        error(Component::Ingest, None, &message);
    } else {
        warn(Component::Ingest, None, &message);
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
    fn test_log_level_from_name() {
        assert_eq!(LogLevel::from_name("WARN"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::from_name("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_name("verbose"), None);
    }

    #[test]
    fn test_failure_classification() {
        let missing_table = "db error: ERROR: relation \"gate_data\" does not exist";
        assert_eq!(classify_store_failure(missing_table), FailureType::Expected);

        let refused = "Connection refused (os error 111)";
        assert_eq!(classify_store_failure(refused), FailureType::Unexpected);

        assert_eq!(classify_store_failure("something odd"), FailureType::Unknown);
    }

    #[test]
    fn test_entry_includes_component_and_location() {
        let entry = Logger::format_entry(LogLevel::Warning, Component::Engine, Some("L1"), "hello");
        assert!(entry.contains("WARN ENGINE [L1]: hello"), "got '{}'", entry);
    }
}
