//! Leveled log writer for the Trellis framework.
//!
//! Provides a small file-backed writer with the eight classic syslog-style
//! severities, structured payload support, and an optional bridge into the
//! `log` macro ecosystem.
//!
//! # Examples
//!
//! ```no_run
//! use trellis_log::{LogWriter, Level};
//!
//! let log = LogWriter::open(".", "local").unwrap();
//! log.info("application started");
//! log.warning("disk space low");
//! ```
//!
//! ## Structured payloads
//!
//! ```no_run
//! use trellis_log::LogWriter;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Login { user: String, ok: bool }
//!
//! let log = LogWriter::open(".", "auth").unwrap();
//! log.info_json(&Login { user: "ada".into(), ok: true });
//! ```

use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Level {
    /// Uppercase name as it appears in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Alert => "ALERT",
            Level::Emergency => "EMERGENCY",
        }
    }

    /// Parse a level from its (case-insensitive) name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "notice" => Some(Level::Notice),
            "warning" | "warn" => Some(Level::Warning),
            "error" => Some(Level::Error),
            "critical" => Some(Level::Critical),
            "alert" => Some(Level::Alert),
            "emergency" => Some(Level::Emergency),
        _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warning,
            log::Level::Error => Level::Error,
        }
    }
}

enum Sink {
    File(PathBuf),
    Stderr,
}

/// Channel-named log writer.
///
/// Cheap to clone; clones share the same sink.
#[derive(Clone)]
pub struct LogWriter {
    name: String,
    min_level: Level,
    sink: Arc<Mutex<Sink>>,
}

impl LogWriter {
    /// Open a writer appending to `<base>/logs/app.log`, creating the
    /// directory if needed.
    pub fn open(base: impl AsRef<Path>, name: impl Into<String>) -> io::Result<Self> {
        let dir = base.as_ref().join("logs");
        fs::create_dir_all(&dir)?;
        let path = dir.join("app.log");
        // Touch the file so permission problems surface at open time.
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            name: name.into(),
            min_level: Level::Debug,
            sink: Arc::new(Mutex::new(Sink::File(path))),
        })
    }

    /// Writer that logs to stderr instead of a file.
    pub fn stderr(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_level: Level::Debug,
            sink: Arc::new(Mutex::new(Sink::Stderr)),
        }
    }

    /// Set the minimum severity that will be written.
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Channel name included in every line.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write a message at the given level.
    pub fn log(&self, level: Level, message: &str) {
        if level < self.min_level {
            return;
        }
        let line = format!(
            "[{}] {}.{}: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.name,
            level.as_str(),
            message
        );
        let sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        match &*sink {
            Sink::File(path) => {
                if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                    let _ = writeln!(file, "{}", line);
                }
            }
            Sink::Stderr => {
                let _ = writeln!(io::stderr().lock(), "{}", line);
            }
        }
    }

    /// Serialize a payload as JSON and log it at the given level.
    pub fn log_json<T: Serialize>(&self, level: Level, payload: &T) {
        match serde_json::to_string(payload) {
            Ok(json) => self.log(level, &json),
            Err(e) => self.log(Level::Error, &format!("unserializable log payload: {}", e)),
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn notice(&self, message: &str) {
        self.log(Level::Notice, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    pub fn critical(&self, message: &str) {
        self.log(Level::Critical, message);
    }

    pub fn alert(&self, message: &str) {
        self.log(Level::Alert, message);
    }

    pub fn emergency(&self, message: &str) {
        self.log(Level::Emergency, message);
    }

    pub fn info_json<T: Serialize>(&self, payload: &T) {
        self.log_json(Level::Info, payload);
    }

    pub fn error_json<T: Serialize>(&self, payload: &T) {
        self.log_json(Level::Error, payload);
    }
}

impl fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogWriter")
            .field("name", &self.name)
            .field("min_level", &self.min_level)
            .finish()
    }
}

// ============================================================================
// `log` crate bridge
// ============================================================================

static BRIDGE: OnceCell<Bridge> = OnceCell::new();

struct Bridge {
    writer: LogWriter,
}

impl log::Log for Bridge {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        self.writer
            .log(record.level().into(), &record.args().to_string());
    }

    fn flush(&self) {}
}

/// Route `log` macro output (`log::info!` et al.) into the given writer.
///
/// Returns an error if a global logger is already installed.
pub fn install_bridge(writer: LogWriter) -> Result<(), log::SetLoggerError> {
    let bridge = BRIDGE.get_or_init(|| Bridge { writer });
    log::set_logger(bridge)?;
    log::set_max_level(log::LevelFilter::Debug);
    Ok(())
}
