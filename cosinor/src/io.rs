//! CSV input/output for observation and result tables.

use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::records::Observation;

/// Errors reading or writing tables and configuration files
#[derive(Error, Debug)]
pub enum TableIoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read observations from CSV with header `subject_id,time_value,item,value`
pub fn read_observations<R: Read>(reader: R) -> Result<Vec<Observation>, TableIoError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut observations = Vec::new();
    for row in csv_reader.deserialize() {
        observations.push(row?);
    }
    Ok(observations)
}

/// Load observations from a CSV file
pub fn load_observations(path: &Path) -> Result<Vec<Observation>, TableIoError> {
    let file = std::fs::File::open(path)?;
    let observations = read_observations(file)?;
    log::info!(
        "Loaded {} observations from {}",
        observations.len(),
        path.display()
    );
    Ok(observations)
}

/// Write rows as CSV with a header derived from the row type
pub fn write_records<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), TableIoError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write rows to a CSV file, creating parent directories as needed
pub fn save_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), TableIoError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_records(file, rows)?;
    log::debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
