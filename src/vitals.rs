//! Vital-sign schema shared by the trainer, the artifact and the service.
//!
//! `FEATURE_COLUMNS` is the only place the feature order is written down.

use csv::{Position, ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::error::{OrchidError, PredictError, Result};

pub const FEATURE_COLUMNS: [&str; 4] = ["systolic", "diastolic", "spo2", "temperature"];
pub const LABEL_COLUMN: &str = "disease";
pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalsSample {
    pub systolic: f64,
    pub diastolic: f64,
    pub spo2: f64,
    pub temperature: f64,
}

impl VitalsSample {
    pub fn from_features(features: [f64; FEATURE_COUNT]) -> Self {
        let [systolic, diastolic, spo2, temperature] = features;
        Self {
            systolic,
            diastolic,
            spo2,
            temperature,
        }
    }

    /// Values in `FEATURE_COLUMNS` order.
    pub fn to_features(&self) -> [f64; FEATURE_COUNT] {
        [self.systolic, self.diastolic, self.spo2, self.temperature]
    }

    /// Parse submitted form fields; the first bad field in column order wins.
    pub fn from_form(fields: &HashMap<String, String>) -> std::result::Result<Self, PredictError> {
        let mut features = [0.0_f64; FEATURE_COUNT];
        for (slot, name) in features.iter_mut().zip(FEATURE_COLUMNS) {
            let raw = fields.get(name).ok_or_else(|| PredictError::missing(name))?;
            *slot = parse_number(raw).ok_or_else(|| PredictError::not_a_number(name, raw))?;
        }
        Ok(Self::from_features(features))
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Feature rows with their labels, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<String>,
}

impl LabeledDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy out the rows at `indices`.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }

    pub fn distinct_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.labels.iter().map(String::as_str).collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }
}

/// Load a CSV dataset
/// Expected header contains: systolic,diastolic,spo2,temperature,disease
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<LabeledDataset> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        OrchidError::Dataset(format!("failed to read {}: {}", path.display(), e))
    })?;
    let dataset = parse_dataset(&text)?;
    info!(
        path = %path.display(),
        rows = dataset.len(),
        labels = dataset.distinct_labels().len(),
        "Loaded vitals dataset"
    );
    Ok(dataset)
}

/// Parse CSV text. Columns are matched by header name, so their order may
/// differ from `FEATURE_COLUMNS` and extra columns are ignored. Quoted fields
/// follow RFC 4180 and a leading UTF-8 BOM is dropped.
pub fn parse_dataset(text: &str) -> Result<LabeledDataset> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let header = reader.headers().map_err(csv_error)?.clone();
    if header.iter().all(str::is_empty) {
        return Err(OrchidError::Dataset("file is empty".to_string()));
    }

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| OrchidError::Dataset(format!("missing column `{name}`")))
    };
    let mut feature_idx = [0usize; FEATURE_COUNT];
    for (slot, name) in feature_idx.iter_mut().zip(FEATURE_COLUMNS) {
        *slot = column(name)?;
    }
    let label_idx = column(LABEL_COLUMN)?;

    let mut dataset = LabeledDataset::default();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line_no = line_of(&record);
        if record.len() != header.len() {
            return Err(OrchidError::Dataset(format!(
                "line {line_no}: expected {} fields, found {}",
                header.len(),
                record.len()
            )));
        }

        let mut row = Vec::with_capacity(FEATURE_COUNT);
        for (&idx, name) in feature_idx.iter().zip(FEATURE_COLUMNS) {
            let raw = &record[idx];
            let value = parse_number(raw).filter(|v| v.is_finite()).ok_or_else(|| {
                OrchidError::Dataset(format!(
                    "line {line_no}: column `{name}` has invalid number {raw:?}"
                ))
            })?;
            row.push(value);
        }

        let label = &record[label_idx];
        if label.is_empty() {
            return Err(OrchidError::Dataset(format!(
                "line {line_no}: column `{LABEL_COLUMN}` is empty"
            )));
        }

        dataset.rows.push(row);
        dataset.labels.push(label.to_string());
    }

    if dataset.is_empty() {
        return Err(OrchidError::Dataset("no data rows after header".to_string()));
    }
    Ok(dataset)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, Position::line)
}

fn csv_error(err: csv::Error) -> OrchidError {
    match err.position() {
        Some(pos) => OrchidError::Dataset(format!("line {}: {err}", pos.line())),
        None => OrchidError::Dataset(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn form_parses_in_feature_order() {
        let sample = VitalsSample::from_form(&form(&[
            ("temperature", "37.0"),
            ("spo2", " 98 "),
            ("diastolic", "80"),
            ("systolic", "120"),
        ]))
        .unwrap();
        assert_eq!(sample.to_features(), [120.0, 80.0, 98.0, 37.0]);
    }

    #[test]
    fn form_reports_missing_field() {
        let err = VitalsSample::from_form(&form(&[
            ("systolic", "120"),
            ("diastolic", "80"),
            ("temperature", "37.0"),
        ]))
        .unwrap_err();
        assert_eq!(err, PredictError::missing("spo2"));
    }

    #[test]
    fn form_reports_first_non_numeric_field() {
        let err = VitalsSample::from_form(&form(&[
            ("systolic", "abc"),
            ("diastolic", "xyz"),
            ("spo2", "98"),
            ("temperature", "37"),
        ]))
        .unwrap_err();
        assert_eq!(err, PredictError::not_a_number("systolic", "abc"));
        assert!(err.to_string().contains("\"abc\""));
    }

    #[test]
    fn dataset_columns_matched_by_name() {
        let text = "disease,temperature,spo2,diastolic,systolic,note\n\
                    Flu,38.5,95,85,130,x\n\
                    \n\
                    \"Healthy\",36.8,99,78,118,y\n";
        let ds = parse_dataset(text).unwrap();
        assert_eq!(ds.rows, vec![vec![130.0, 85.0, 95.0, 38.5], vec![118.0, 78.0, 99.0, 36.8]]);
        assert_eq!(ds.labels, vec!["Flu".to_string(), "Healthy".to_string()]);
        assert_eq!(ds.distinct_labels(), vec!["Flu", "Healthy"]);
    }

    #[test]
    fn dataset_errors_carry_line_numbers() {
        let bad_number = "systolic,diastolic,spo2,temperature,disease\n120,80,98,37,Healthy\n120,eighty,98,37,Flu\n";
        let err = parse_dataset(bad_number).unwrap_err().to_string();
        assert!(err.contains("line 3"), "{err}");
        assert!(err.contains("diastolic"), "{err}");

        let short_row = "systolic,diastolic,spo2,temperature,disease\n120,80,98\n";
        assert!(parse_dataset(short_row).unwrap_err().to_string().contains("line 2"));
    }

    #[test]
    fn dataset_rejects_missing_column_and_empty_input() {
        assert!(parse_dataset("systolic,diastolic,temperature,disease\n1,2,3,x\n").is_err());
        assert!(parse_dataset("").is_err());
        assert!(parse_dataset("systolic,diastolic,spo2,temperature,disease\n").is_err());
        assert!(parse_dataset("systolic,diastolic,spo2,temperature,disease\n1,2,nan,4,x\n").is_err());
    }

    #[test]
    fn dataset_label_may_contain_quoted_comma() {
        let text = "systolic,diastolic,spo2,temperature,disease\n\
                    120,80,98,37,\"Flu, mild\"\n\
                    118,76,99,36.7,Healthy\n";
        let ds = parse_dataset(text).unwrap();
        assert_eq!(ds.rows[0], vec![120.0, 80.0, 98.0, 37.0]);
        assert_eq!(ds.labels, vec!["Flu, mild".to_string(), "Healthy".to_string()]);
    }

    #[test]
    fn dataset_unescapes_doubled_quotes() {
        let text = "systolic,diastolic,spo2,temperature,disease\n\
                    120,80,98,37,\"Type \"\"A\"\" flu\"\n";
        let ds = parse_dataset(text).unwrap();
        assert_eq!(ds.labels, vec!["Type \"A\" flu".to_string()]);
    }

    #[test]
    fn dataset_header_may_start_with_bom() {
        let text = "\u{feff}systolic,diastolic,spo2,temperature,disease\n120,80,98,37,Healthy\n";
        let ds = parse_dataset(text).unwrap();
        assert_eq!(ds.rows, vec![vec![120.0, 80.0, 98.0, 37.0]]);
        assert_eq!(ds.labels, vec!["Healthy".to_string()]);
    }

    #[test]
    fn subset_keeps_rows_and_labels_aligned() {
        let ds = LabeledDataset {
            rows: vec![vec![1.0], vec![2.0], vec![3.0]],
            labels: vec!["a".into(), "b".into(), "c".into()],
        };
        let sub = ds.subset(&[2, 0]);
        assert_eq!(sub.rows, vec![vec![3.0], vec![1.0]]);
        assert_eq!(sub.labels, vec!["c".to_string(), "a".to_string()]);
    }
}
