//! CSV export

use std::io::Write;

use crate::error::{TallyError, TallyResult};

/// A report that can be flattened into CSV rows
pub trait Tabular {
    fn headers(&self) -> Vec<&'static str>;
    fn rows(&self) -> Vec<Vec<String>>;
}

/// Write the report's header and rows as CSV
pub fn write_csv<T: Tabular, W: Write>(report: &T, writer: W) -> TallyResult<()> {
    let mut csv = ::csv::Writer::from_writer(writer);

    csv.write_record(report.headers())
        .map_err(|e| TallyError::Export(e.to_string()))?;
    for row in report.rows() {
        csv.write_record(&row)
            .map_err(|e| TallyError::Export(e.to_string()))?;
    }

    csv.flush().map_err(|e| TallyError::Export(e.to_string()))
}
