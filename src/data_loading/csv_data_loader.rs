use super::data_loader::{dense_from_rows, DataLoader, Dataset, DatasetSource};
use super::schema::{encode_gender, encode_label, COLUMN_NAMES, GENDER_COLUMN, LABEL_COLUMN};
use crate::error::{HepatoError, Result};
use csv::ReaderBuilder;
use std::time::Duration;

/// CSV loader for the header-less ILPD layout.
pub struct IlpdCsvLoader {
    fetch_timeout: Duration,
}

impl IlpdCsvLoader {
    pub fn new() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(fetch_timeout: Duration) -> Self {
        Self { fetch_timeout }
    }

    /// Parses CSV text; `source_desc` only labels errors.
    pub fn parse(&self, csv_text: &str, source_desc: &str) -> Result<Dataset> {
        let fail = |reason: String| HepatoError::data_unavailable(source_desc, reason);

        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .trim(csv::Trim::All)
            .from_reader(csv_text.as_bytes());

        let mut x_rows: Vec<Vec<f64>> = Vec::new();
        let mut y_data: Vec<f64> = Vec::new();
        let mut dropped = 0usize;

        for (idx, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| fail(format!("row {}: {}", idx + 1, e)))?;
            if record.len() != COLUMN_NAMES.len() {
                return Err(fail(format!(
                    "row {} has {} columns, expected {}",
                    idx + 1,
                    record.len(),
                    COLUMN_NAMES.len()
                )));
            }

            if record.iter().any(|field| field.is_empty()) {
                dropped += 1;
                continue;
            }

            let mut row = Vec::with_capacity(COLUMN_NAMES.len() - 1);
            for (col, field) in record.iter().enumerate() {
                match col {
                    GENDER_COLUMN => row.push(encode_gender(field).ok_or_else(|| {
                        fail(format!("row {}: unknown gender '{}'", idx + 1, field))
                    })?),
                    LABEL_COLUMN => y_data.push(encode_label(field).ok_or_else(|| {
                        fail(format!("row {}: unknown disease code '{}'", idx + 1, field))
                    })?),
                    _ => row.push(Self::parse_numeric_value(field).ok_or_else(|| {
                        fail(format!(
                            "value '{}' in column '{}' (row {}) is not a number",
                            field,
                            COLUMN_NAMES[col],
                            idx + 1
                        ))
                    })?),
                }
            }
            x_rows.push(row);
        }

        if x_rows.is_empty() {
            return Err(fail("no complete rows".to_string()));
        }

        tracing::debug!(
            rows = x_rows.len(),
            dropped,
            "parsed ILPD table"
        );

        let x_data = dense_from_rows(&x_rows).map_err(fail)?;
        Ok(Dataset::new(x_data, y_data, dropped))
    }

    fn parse_numeric_value(val: &str) -> Option<f64> {
        val.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl DataLoader for IlpdCsvLoader {
    fn get_name(&self) -> &str {
        "ILPD CSV Loader"
    }

    fn load(&self, source: &DatasetSource) -> Result<Dataset> {
        let text = source.read_to_string(self.fetch_timeout)?;
        let dataset = self.parse(&text, &source.to_string())?;
        tracing::info!(
            loader = self.get_name(),
            source = %source,
            rows = dataset.num_samples(),
            dropped = dataset.dropped_rows,
            "dataset loaded"
        );
        Ok(dataset)
    }
}

impl Default for IlpdCsvLoader {
    fn default() -> Self {
        Self::new()
    }
}
