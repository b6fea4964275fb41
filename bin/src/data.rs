//! Data loading utilities for the ronda CLI.

use std::path::PathBuf;

use polars::prelude::*;
use ronda_traits::{columns, RondaError};

/// Load a customer snapshot from a CSV file.
///
/// The file must carry a header row with the required snapshot columns;
/// anything missing is reported before the pipeline starts.
pub(crate) fn load_snapshot(path: &str) -> Result<DataFrame, RondaError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()?;

    for required in columns::REQUIRED {
        if df.column(required).is_err() {
            return Err(RondaError::MissingColumn(required.to_string()));
        }
    }

    Ok(df)
}

/// Write a result table to a CSV file.
pub(crate) fn write_csv(df: &mut DataFrame, path: &str) -> Result<(), RondaError> {
    let mut file = std::fs::File::create(path)
        .map_err(|e| RondaError::Other(format!("cannot create {path}: {e}")))?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}
