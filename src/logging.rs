// Logging module for boundq hosts
// Provides a process-wide `log` backend suited to reading queue traces
// from many producer and consumer threads at once.
//
// Every record carries the emitting thread's name, so a blocked put, the
// take that freed it and the close that ended the stream can be lined up.
// Output is text or JSON, to the console, a file, or both, with independent
// levels for console and file.
//
// Example usage:
// ```
// let config = LogConfig {
//     console_level: LevelFilter::Info,
//     file_level: Some(LevelFilter::Trace),
//     format: LogFormat::Json,
//     destination: LogDestination::Both(PathBuf::from("queue.log")),
// };
// init_logger(config)?;
// ```

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{Level, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;

/// Log output format options
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// Log destination options
#[derive(Debug, Clone, PartialEq)]
pub enum LogDestination {
    Console,
    File(PathBuf),
    Both(PathBuf),
}

/// JSON log entry structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLogEntry {
    pub timestamp: String,
    pub level: String,
    pub thread: String,
    pub target: String,
    pub message: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

impl LogConfig {
    /// Most verbose level any destination wants
    pub fn max_level(&self) -> LevelFilter {
        match self.file_level {
            Some(file_level) => file_level.max(self.console_level),
            None => self.console_level,
        }
    }
}

/// The fields of one record, captured on the logging thread
struct LogLine<'a> {
    level: Level,
    thread: String,
    target: &'a str,
    message: String,
}

/// Logger backend for queue hosts
pub struct QueueLogger {
    config: LogConfig,
}

impl QueueLogger {
    pub fn new(config: LogConfig) -> Self {
        Self { config }
    }

    fn format_timestamp() -> String {
        let now: DateTime<Local> = Local::now();
        now.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn current_thread_name() -> String {
        let current = thread::current();
        match current.name() {
            Some(name) => name.to_string(),
            None => format!("{:?}", current.id()),
        }
    }

    fn format_text(&self, line: &LogLine<'_>) -> String {
        format!(
            "{} [{}] [{}] {}",
            Self::format_timestamp(),
            line.level.to_string().to_uppercase(),
            line.thread,
            line.message
        )
    }

    fn format_json(&self, line: &LogLine<'_>) -> Result<String> {
        let entry = JsonLogEntry {
            timestamp: Self::format_timestamp(),
            level: line.level.to_string().to_uppercase(),
            thread: line.thread.clone(),
            target: line.target.to_string(),
            message: line.message.clone(),
        };

        serde_json::to_string(&entry).context("Failed to serialize log entry to JSON")
    }

    fn format_line(&self, line: &LogLine<'_>) -> String {
        match self.config.format {
            LogFormat::Text => self.format_text(line),
            LogFormat::Json => match self.format_json(line) {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("JSON formatting error: {}. Falling back to text format.", e);
                    self.format_text(line)
                }
            },
        }
    }

    fn should_log_to_console(&self, level: Level) -> bool {
        !matches!(self.config.destination, LogDestination::File(_))
            && level <= self.config.console_level
    }

    fn should_log_to_file(&self, level: Level) -> bool {
        match self.config.file_level {
            Some(file_level) => self.file_path().is_some() && level <= file_level,
            None => false,
        }
    }

    fn file_path(&self) -> Option<&PathBuf> {
        match &self.config.destination {
            LogDestination::Console => None,
            LogDestination::File(path) | LogDestination::Both(path) => Some(path),
        }
    }

    fn write_to_console(&self, formatted: &str) -> Result<()> {
        writeln!(io::stderr(), "{}", formatted).context("Failed to write to console")
    }

    fn write_to_file(&self, formatted: &str, file_path: &PathBuf) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)
            .with_context(|| format!("Failed to open log file: {}", file_path.display()))?;

        writeln!(file, "{}", formatted).context("Failed to write to log file")
    }
}

impl log::Log for QueueLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.should_log_to_console(metadata.level()) || self.should_log_to_file(metadata.level())
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = LogLine {
            level: record.level(),
            thread: Self::current_thread_name(),
            target: record.target(),
            message: record.args().to_string(),
        };
        let formatted = self.format_line(&line);

        if self.should_log_to_console(line.level) {
            if let Err(e) = self.write_to_console(&formatted) {
                eprintln!("Console logging error: {}", e);
            }
        }
        if self.should_log_to_file(line.level) {
            if let Some(path) = self.file_path() {
                if let Err(e) = self.write_to_file(&formatted, path) {
                    eprintln!("File logging error: {}", e);
                }
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Initialize the logging system with the given configuration
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = config.max_level();
    let logger = QueueLogger::new(config);

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(max_level);

    Ok(())
}

/// Convert string to LevelFilter
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(anyhow::anyhow!(
            "Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off",
            level_str
        )),
    }
}
