//! Tabular batch input: parsing uploaded CSV into ordered rows.

use super::InferenceError;
use super::encoder::{EncodeError, RawRecord, RawValue};
use super::predictor::Scored;
use std::collections::HashSet;

/// One uploaded row, with its cells in header order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRow {
    pub fields: Vec<(String, String)>,
}

impl BatchRow {
    pub fn to_raw_record(&self) -> RawRecord {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), RawValue::Text(value.clone())))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }
}

/// A row together with the outcome of scoring it. Failed rows keep their position.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub row: BatchRow,
    pub result: Result<Scored, EncodeError>,
}

/// Parse a comma separated upload with a header row.
///
/// Anything that is not well-formed tabular data fails the whole upload before any row is
/// scored: unreadable bytes, a missing or repeated header, or rows whose width differs from the
/// header.
pub fn parse_csv(data: &[u8], max_rows: usize) -> Result<Vec<BatchRow>, InferenceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| InferenceError::MalformedBatch(format!("Could not read CSV header: {e}")))?
        .clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(InferenceError::MalformedBatch("CSV file has no header row".to_string()));
    }
    let mut seen = HashSet::with_capacity(headers.len());
    if let Some(duplicate) = headers.iter().find(|header| !seen.insert(*header)) {
        return Err(InferenceError::MalformedBatch(format!("Duplicate CSV column '{duplicate}'")));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| InferenceError::MalformedBatch(format!("Invalid CSV at row {}: {e}", index + 1)))?;
        if rows.len() == max_rows {
            return Err(InferenceError::MalformedBatch(format!(
                "CSV file exceeds the limit of {max_rows} rows"
            )));
        }
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        rows.push(BatchRow { fields });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_row_and_column_order() {
        let data = b"age,department,over_time\n30,Sales,Yes\n41, Research & Development ,No\n";
        let rows = parse_csv(data, 100).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].fields,
            vec![
                ("age".to_string(), "30".to_string()),
                ("department".to_string(), "Sales".to_string()),
                ("over_time".to_string(), "Yes".to_string()),
            ]
        );
        assert_eq!(rows[1].get("department"), Some("Research & Development"));
        assert_eq!(rows[1].to_raw_record()["age"], RawValue::Text("41".to_string()));
    }

    #[test]
    fn test_duplicate_columns_are_malformed() {
        let err = parse_csv(b"age,department,age\n30,Sales,41\n", 10).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedBatch(msg) if msg == "Duplicate CSV column 'age'"));
    }

    #[test]
    fn test_header_only_is_an_empty_batch() {
        assert!(parse_csv(b"age,department\n", 10).unwrap().is_empty());
    }

    #[test]
    fn test_ragged_rows_are_malformed() {
        let err = parse_csv(b"age,department\n30,Sales,extra\n", 10).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedBatch(msg) if msg.contains("row 1")));
    }

    #[test]
    fn test_empty_upload_is_malformed() {
        assert!(matches!(parse_csv(b"", 10), Err(InferenceError::MalformedBatch(_))));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let data = b"age,department\n30,\xff\xfe\n";
        assert!(matches!(parse_csv(data, 10), Err(InferenceError::MalformedBatch(_))));
    }

    #[test]
    fn test_row_limit() {
        let data = b"age\n1\n2\n3\n";
        assert_eq!(parse_csv(data, 3).unwrap().len(), 3);
        assert!(matches!(parse_csv(data, 2), Err(InferenceError::MalformedBatch(msg)) if msg.contains("2 rows")));
    }
}
