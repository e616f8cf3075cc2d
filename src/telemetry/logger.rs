//! JSONL telemetry logger with file rotation.
//!
//! Each [`InputSnapshot`] becomes one JSON object per line, stamped with the
//! UTC time it was logged:
//!
//! ```text
//! {"timestamp":"2026-10-18T09:12:44.120Z","raw":[2048,...],"normalized":[0,...],"battery_voltage":839,"rounds":1200,"anomalies":0}
//! ```
//!
//! A new file is started every `max_records_per_file` records and only the
//! newest `max_files_to_keep` files are retained.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::adc::controller::InputSnapshot;
use crate::config::TelemetryConfig;
use crate::error::{Result, TxAnalogError};

/// File name prefix of telemetry logs
const FILE_PREFIX: &str = "telemetry_";

/// File name extension of telemetry logs
const FILE_EXTENSION: &str = "jsonl";

#[derive(Serialize)]
struct TelemetryRecord<'a> {
    timestamp: String,
    #[serde(flatten)]
    snapshot: &'a InputSnapshot,
}

/// Rotating JSONL writer for input snapshots
#[derive(Debug)]
pub struct TelemetryLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    files_opened: u64,
}

impl TelemetryLogger {
    /// Create a logger writing into `dir`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns error if the limits are zero or the directory cannot be created
    pub fn new<P: AsRef<Path>>(dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        if max_records_per_file == 0 || max_files_to_keep == 0 {
            return Err(TxAnalogError::Telemetry(
                "record and file limits must be greater than 0".to_string(),
            ));
        }

        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("Telemetry logging to {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file,
            max_files_to_keep,
            writer: None,
            current_path: None,
            records_in_file: 0,
            files_opened: 0,
        })
    }

    /// Create a logger from the `[telemetry]` config section
    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        Self::new(&config.log_dir, config.max_records_per_file, config.max_files_to_keep)
    }

    /// Append a snapshot stamped with the current time
    pub fn log(&mut self, snapshot: &InputSnapshot) -> Result<()> {
        self.log_at(Utc::now(), snapshot)
    }

    /// Append a snapshot with an explicit timestamp
    pub fn log_at(&mut self, timestamp: DateTime<Utc>, snapshot: &InputSnapshot) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate(timestamp)?;
        }

        let record = TelemetryRecord {
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            snapshot,
        };
        let line = serde_json::to_string(&record)?;

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| TxAnalogError::Telemetry("no telemetry file open".to_string()))?;
        writeln!(writer, "{}", line)?;
        self.records_in_file += 1;

        Ok(())
    }

    /// Flush buffered records to disk
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Path of the file currently being written
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    fn rotate(&mut self, timestamp: DateTime<Utc>) -> Result<()> {
        self.flush()?;

        let name = format!(
            "{}{}_{:06}.{}",
            FILE_PREFIX,
            timestamp.format("%Y%m%d_%H%M%S"),
            self.files_opened,
            FILE_EXTENSION
        );
        let path = self.dir.join(name);
        let file = File::create(&path)?;
        debug!("Opened telemetry file {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;
        self.files_opened += 1;

        self.prune()
    }

    /// Delete the oldest log files beyond `max_files_to_keep`
    fn prune(&self) -> Result<()> {
        let mut files = log_files(&self.dir)?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            debug!("Removing old telemetry file {}", path.display());
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

impl Drop for TelemetryLogger {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Telemetry log files in `dir`, unsorted
fn log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION))
            .unwrap_or(false);
        if is_log {
            files.push(path);
        }
    }
    Ok(files)
}
