//! CSV encoding of a [`TabularArtifact`].
//!
//! Layout: a header row with an empty index label followed by the column
//! labels, then one row per table row led by its zero-based row index.

use crate::contract::PipelineError;
use crate::dataset::TabularArtifact;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush csv buffer: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv header must start with an empty index column")]
    MissingIndexColumn,
    #[error("row {row}: expected index {row} but found '{found}'")]
    IndexMismatch { row: usize, found: String },
    #[error("row {row}, column '{column}': '{value}' is not an integer")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error(transparent)]
    Table(#[from] PipelineError),
}

/// Serializes the whole table into an in-memory CSV buffer.
pub fn to_csv_bytes(artifact: &TabularArtifact) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let mut header = Vec::with_capacity(artifact.n_cols() + 1);
    header.push("");
    header.extend(artifact.columns().iter().map(String::as_str));
    wtr.write_record(&header)?;

    for (index, row) in artifact.rows().iter().enumerate() {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(index.to_string());
        record.extend(row.iter().map(i64::to_string));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    wtr.into_inner().map_err(|error| ExportError::Io(error.into_error()))
}

/// Parses CSV written by [`to_csv_bytes`] back into a table, dropping the index column.
pub fn from_csv_bytes(bytes: &[u8]) -> Result<TabularArtifact, ExportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let header = rdr.headers()?.clone();
    if header.get(0) != Some("") {
        return Err(ExportError::MissingIndexColumn);
    }
    let columns: Vec<String> = header.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for (row_index, record) in rdr.records().enumerate() {
        let record = record?;
        let found = record.get(0).unwrap_or_default();
        if found != row_index.to_string() {
            return Err(ExportError::IndexMismatch {
                row: row_index,
                found: found.to_string(),
            });
        }

        let values = record
            .iter()
            .skip(1)
            .zip(columns.iter())
            .map(|(value, column)| {
                value.parse::<i64>().map_err(|_| ExportError::InvalidValue {
                    row: row_index,
                    column: column.clone(),
                    value: value.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }

    Ok(TabularArtifact::from_parts(columns, rows)?)
}
