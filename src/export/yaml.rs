//! YAML export

use std::io::Write;

use serde::Serialize;

use crate::error::{TallyError, TallyResult};

/// Write any serializable report as YAML, preceded by a comment header
pub fn write_yaml<T: Serialize, W: Write>(report: &T, mut writer: W) -> TallyResult<()> {
    writeln!(writer, "# tally report")
        .and_then(|_| writeln!(writer, "# Generated: {}", chrono::Utc::now().to_rfc3339()))
        .map_err(|e| TallyError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, report).map_err(|e| TallyError::Export(e.to_string()))
}
