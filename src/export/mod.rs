use std::{fmt, io};
use std::path::Path;

use csv::WriterBuilder;
use log::info;

use crate::entry::Entry;

pub(crate) const MAIN_TABLE_FILE: &str = "main_table.csv";
pub(crate) const FILTERED_TABLE_FILE: &str = "filtered_table.csv";

const HEADER: [&str; 4] = ["Date", "Flat", "Item", "Amount"];

#[derive(Debug)]
pub(crate) enum ExportError {
    Csv(csv::Error),
    Io(io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExportError::Csv(e) => write!(f, "export failed: {e}"),
            ExportError::Io(e) => write!(f, "export failed: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e)
    }
}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> Self {
        ExportError::Io(e)
    }
}

/// Turns a sequence of entries into a tabular document at `destination`
pub(crate) trait Exporter {
    /// Returns the number of rows written, not counting the header
    fn export(&self, rows: &[&Entry], destination: &Path) -> Result<usize, ExportError>;
}

pub(crate) struct CsvExporter;

impl Exporter for CsvExporter {
    fn export(&self, rows: &[&Entry], destination: &Path) -> Result<usize, ExportError> {
        // Header is written by hand so that an empty table still gets one
        let mut csv_writer = WriterBuilder::new().has_headers(false).from_path(destination)?;
        csv_writer.write_record(HEADER)?;
        for e in rows {
            csv_writer.write_record([e.date.as_str(), e.flat.as_str(), e.item.as_str(), e.amount.to_string().as_str()])?;
        }
        csv_writer.flush()?;

        info!("Exported {} rows to {}", rows.len(), destination.display());
        Ok(rows.len())
    }
}
