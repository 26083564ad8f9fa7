//! Append-only text log of pressure readings.
//!
//! One line per reading, `YYYY-MM-DD HH:MM:SS, <value> mbar`. The file is
//! opened and closed for every line so a crash loses at most the line being
//! written.

use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use pressure_logger_model::{Reading, PRESSURE_UNIT};

use crate::{Error, Result};

/// Formats one log line, without the line terminator.
pub fn format_line(timestamp: &str, value: impl Display) -> String {
    format!("{timestamp}, {value} {PRESSURE_UNIT}")
}

pub struct PressureLog {
    path: PathBuf,
}

impl PressureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line, creating the file if needed, and returns the line.
    pub fn append(&self, timestamp: &str, value: impl Display) -> Result<String> {
        let line = format_line(timestamp, value);
        let write_error = |source| Error::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_error)?;
        writeln!(file, "{line}").map_err(write_error)?;

        log::info!("Logged: {line}");
        Ok(line)
    }

    pub fn append_reading(&self, reading: &Reading) -> Result<String> {
        self.append(&reading.timestamp_string(), reading.value)
    }
}
