//! Append-only JSONL audit log

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{TallyError, TallyResult};

use super::entry::AuditEntry;

/// Writes audit entries one JSON object per line
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append one entry and flush
    pub fn log(&self, entry: &AuditEntry) -> TallyResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| TallyError::Io(format!("Failed to open audit log: {}", e)))?;

        let json = serde_json::to_string(entry)
            .map_err(|e| TallyError::Json(format!("Failed to serialize audit entry: {}", e)))?;

        writeln!(file, "{}", json)
            .and_then(|_| file.flush())
            .map_err(|e| TallyError::Io(format!("Failed to write audit entry: {}", e)))
    }

    /// All entries, oldest first
    pub fn read_all(&self) -> TallyResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| TallyError::Io(format!("Failed to open audit log: {}", e)))?;

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                TallyError::Io(format!("Failed to read audit log line {}: {}", index + 1, e))
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let entry = serde_json::from_str(&line).map_err(|e| {
                TallyError::Json(format!("Bad audit entry at line {}: {}", index + 1, e))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// The last `count` entries, oldest first
    pub fn read_recent(&self, count: usize) -> TallyResult<Vec<AuditEntry>> {
        self.read_recent_matching(count, |_| true)
    }

    /// The last `count` entries accepted by `filter`, oldest first
    pub fn read_recent_matching<F>(&self, count: usize, filter: F) -> TallyResult<Vec<AuditEntry>>
    where
        F: Fn(&AuditEntry) -> bool,
    {
        let mut entries: Vec<AuditEntry> =
            self.read_all()?.into_iter().filter(|e| filter(e)).collect();
        let start = entries.len().saturating_sub(count);
        Ok(entries.split_off(start))
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
