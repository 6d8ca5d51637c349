//! Logging module for rustor-reflect
//!
//! Records configuration loading, source scanning, locator lookups and
//! reflection cache activity to a file, for debugging why a symbol did or
//! did not resolve.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Global logger instance
static LOGGER: Mutex<Option<ReflectLogger>> = Mutex::new(None);

/// Logger for reflection operations
pub struct ReflectLogger {
    file: File,
    path: PathBuf,
}

impl ReflectLogger {
    /// Create a new logger writing to the specified path
    pub fn new(log_path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_path)?;

        Ok(Self {
            file,
            path: log_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a log message
    pub fn log(&mut self, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(self.file, "[{}] {}", timestamp, message);
        let _ = self.file.flush();
    }

    /// Log a section header
    pub fn section(&mut self, title: &str) {
        let separator = "=".repeat(60);
        self.log(&separator);
        self.log(title);
        self.log(&separator);
    }
}

/// Initialize the global logger
pub fn init_logger(log_path: Option<&Path>) -> std::io::Result<PathBuf> {
    let path = log_path.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        PathBuf::from(format!("/tmp/rustor-reflect-{}.log", timestamp))
    });

    let logger = ReflectLogger::new(&path)?;

    if let Ok(mut guard) = LOGGER.lock() {
        *guard = Some(logger);
    }

    Ok(path)
}

/// Log a message to the global logger
pub fn log(message: &str) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            logger.log(message);
        }
    }
}

/// Log a section header
pub fn section(title: &str) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            logger.section(title);
        }
    }
}

/// Check if logging is enabled
pub fn is_enabled() -> bool {
    if let Ok(guard) = LOGGER.lock() {
        guard.is_some()
    } else {
        false
    }
}

/// Log configuration loading
pub fn log_config_load(path: &Path) {
    section("CONFIGURATION LOADING");
    log(&format!("Loading config from: {}", path.display()));
}

/// Log the result of asking one locator for a symbol
pub fn log_locate(locator: &str, name: &str, found: bool) {
    if found {
        log(&format!("[{}] located {}", locator, name));
    } else {
        log(&format!("[{}] miss {}", locator, name));
    }
}

/// Log a reflection request, served from the cache or freshly built
pub fn log_reflect(name: &str, cached: bool) {
    if cached {
        log(&format!("reflect {} (cached)", name));
    } else {
        log(&format!("reflect {}", name));
    }
}

/// Log a detected inheritance cycle
pub fn log_cycle(chain: &[String]) {
    log(&format!("CYCLE: {}", chain.join(" -> ")));
}

/// Log a directory scan result
pub fn log_scan_summary(roots: &[PathBuf], files: usize, symbols: usize, failures: usize) {
    section("SOURCE SCAN");
    for root in roots {
        log(&format!("Root: {}", root.display()));
    }
    log(&format!("Files parsed: {}", files));
    log(&format!("Symbols indexed: {}", symbols));
    if failures > 0 {
        log(&format!("Files failed to parse: {}", failures));
    }
}
