//! JSON export

use std::io::Write;

use serde::Serialize;

use crate::error::{TallyError, TallyResult};

/// Write any serializable report as pretty-printed JSON
pub fn write_json<T: Serialize, W: Write>(report: &T, mut writer: W) -> TallyResult<()> {
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| TallyError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| TallyError::Export(e.to_string()))
}
