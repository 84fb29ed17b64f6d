//! Report export
//!
//! Any report that is `Serialize` and [`Tabular`] can be written as:
//! - CSV: one row per report line (spreadsheet-compatible)
//! - JSON: the full report structure
//! - YAML: the full report structure, human-readable

pub mod csv;
pub mod json;
pub mod yaml;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::{TallyError, TallyResult};

pub use self::csv::{write_csv, Tabular};
pub use self::json::write_json;
pub use self::yaml::write_yaml;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Yaml,
}

impl ExportFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Write a report in the requested format
pub fn export_report<T, W>(report: &T, format: ExportFormat, writer: W) -> TallyResult<()>
where
    T: Serialize + Tabular,
    W: Write,
{
    match format {
        ExportFormat::Csv => write_csv(report, writer),
        ExportFormat::Json => write_json(report, writer),
        ExportFormat::Yaml => write_yaml(report, writer),
    }
}

/// Write a report to a file, creating or truncating it
pub fn export_report_to_file<T>(report: &T, format: ExportFormat, path: &Path) -> TallyResult<()>
where
    T: Serialize + Tabular,
{
    let file = File::create(path)
        .map_err(|e| TallyError::Export(format!("Cannot create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    export_report(report, format, &mut writer)?;
    writer
        .flush()
        .map_err(|e| TallyError::Export(e.to_string()))
}
