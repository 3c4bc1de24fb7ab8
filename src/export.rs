use chrono::Utc;
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Result, ScancamError};
use crate::inventory::InventoryRecord;

/// Supported export formats for the scanned-item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One barcode per line
    Text,
    /// Machine-readable CSV for spreadsheet import
    Csv,
    /// Pretty-printed JSON for automation
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

/// Default export file name, e.g. `scanned-items-2026-08-07.csv`.
pub fn default_file_name(format: ExportFormat) -> String {
    format!(
        "scanned-items-{}.{}",
        Utc::now().format("%Y-%m-%d"),
        format.extension()
    )
}

/// A single row in the CSV output.
#[derive(Debug, Serialize)]
struct CsvRow {
    id: String,
    barcode: String,
    format: String,
    design: String,
    /// Semicolon-separated list
    sizes: String,
    /// Semicolon-separated list
    colors: String,
    price: Option<f64>,
    /// RFC 3339
    created_at: String,
}

impl From<&InventoryRecord> for CsvRow {
    fn from(record: &InventoryRecord) -> Self {
        Self {
            id: record.id.to_string(),
            barcode: record.barcode.clone(),
            format: record.format.to_string(),
            design: record.design.clone(),
            sizes: record.sizes.join(";"),
            colors: record.colors.join(";"),
            price: record.price,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// Write the record list to the given writer in the chosen format.
pub fn write_to<W: Write>(
    records: &[InventoryRecord],
    format: ExportFormat,
    writer: &mut W,
) -> Result<()> {
    debug!("Exporting {} record(s) as {:?}", records.len(), format);

    match format {
        ExportFormat::Text => {
            for record in records {
                writeln!(writer, "{}", record.barcode)?;
            }
        }
        ExportFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for record in records {
                csv_writer.serialize(CsvRow::from(record))?;
            }
            csv_writer.flush()?;
        }
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, records)?;
            writeln!(writer)?;
        }
    }

    Ok(())
}

/// Render the record list to a string in the chosen format.
pub fn render(records: &[InventoryRecord], format: ExportFormat) -> Result<String> {
    let mut buffer = Vec::new();
    write_to(records, format, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ScancamError::system(format!("export not UTF-8: {}", e)))
}
