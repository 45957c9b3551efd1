//! Delimited (CSV/TSV) table reader.
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::config::DatasetConfig;
use crate::data_handling::{split_features_labels, Dataset, Table};

/// Read a delimited file with a header row into a raw string [`Table`].
///
/// Cells are trimmed. Rows whose length differs from the header are rejected
/// by the CSV reader.
pub fn read_table<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Table> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open table: {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() {
        return Err(anyhow!("No columns found in {}", path.display()));
    }

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse row {} of {}", row_idx + 1, path.display())
        })?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    log::debug!(
        "Read {} rows x {} columns from {}",
        rows.len(),
        headers.len(),
        path.display()
    );

    Ok(Table { headers, rows })
}

/// Read a delimited file and split it into features and binary labels.
pub fn read_dataset<P: AsRef<Path>>(path: P, config: &DatasetConfig) -> Result<Dataset> {
    let path = path.as_ref();
    let delimiter = config.delimiter_byte().map_err(anyhow::Error::msg)?;
    let table = read_table(path, delimiter)?;
    let dataset = split_features_labels(&table, config)
        .with_context(|| format!("Invalid dataset in {}", path.display()))?;
    Ok(dataset)
}
