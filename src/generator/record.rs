//! Per-student record normalization.
//!
//! Applies the column mapping to a raw row, renders cell values as display
//! strings, substitutes the configured default for null-ish cells, and injects
//! the class label. Rows without a usable identifying value are signaled as
//! skipped rather than failing the batch.

use std::collections::BTreeMap;

use calamine::{Data, DataType};
use thiserror::Error;

use super::common::display_class_label;
use super::mapping::ColumnMapping;

/// Normalized key/value data used to fill one document instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, String>,
    display_name: String,
}

impl Record {
    pub fn new(fields: BTreeMap<String, String>, display_name: String) -> Self {
        Self {
            fields,
            display_name,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The identifying value; used for progress lines and the output filename.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Non-fatal signal: the row cannot become a record.
#[derive(Debug, Error)]
#[error("row {row} skipped: {reason}")]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

pub struct RecordNormalizer<'m> {
    mapping: &'m ColumnMapping,
    null_indicators: Vec<String>,
    default_value: String,
    identity_key: String,
    class_field: Option<(String, String)>,
}

impl<'m> RecordNormalizer<'m> {
    pub fn new(
        mapping: &'m ColumnMapping,
        null_indicators: &[String],
        default_value: &str,
        identity_key: &str,
    ) -> Self {
        let null_indicators = null_indicators
            .iter()
            .map(|v| normalize_indicator(v))
            .collect();

        Self {
            mapping,
            null_indicators,
            default_value: default_value.to_string(),
            identity_key: identity_key.to_string(),
            class_field: None,
        }
    }

    /// Inject the class label into every record under `key`, with underscores
    /// rendered as spaces.
    pub fn with_class_field(mut self, key: &str, label: &str) -> Self {
        self.class_field = Some((key.to_string(), display_class_label(label)));
        self
    }

    pub fn normalize(&self, row_number: usize, row: &[Data]) -> Result<Record, SkippedRow> {
        let mut fields = BTreeMap::new();
        for (key, column) in self.mapping.entries() {
            fields.insert(key.to_string(), self.clean_cell(row.get(column)));
        }

        if let Some((key, value)) = &self.class_field {
            fields.insert(key.clone(), value.clone());
        }

        let display_name = match fields.get(&self.identity_key) {
            Some(value) if !value.is_empty() && *value != self.default_value => value.clone(),
            _ => {
                return Err(SkippedRow {
                    row: row_number,
                    reason: format!("no usable '{}' value", self.identity_key),
                })
            }
        };

        Ok(Record::new(fields, display_name))
    }

    fn clean_cell(&self, cell: Option<&Data>) -> String {
        let rendered = match cell {
            None | Some(Data::Empty) => return self.default_value.clone(),
            Some(Data::String(s)) => s.trim().to_string(),
            Some(Data::Int(i)) => i.to_string(),
            Some(Data::Float(f)) => {
                if f.is_nan() {
                    return self.default_value.clone();
                }
                format_number(*f)
            }
            Some(Data::Bool(b)) => b.to_string(),
            Some(cell @ Data::DateTime(_)) => match cell.as_datetime() {
                Some(dt) if dt.time() == chrono::NaiveTime::MIN => {
                    dt.date().format("%Y-%m-%d").to_string()
                }
                Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => return self.default_value.clone(),
            },
            Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => s.clone(),
            Some(Data::Error(_)) => return self.default_value.clone(),
        };

        if rendered.is_empty() || self.matches_null(&rendered) {
            self.default_value.clone()
        } else {
            rendered
        }
    }

    fn matches_null(&self, value: &str) -> bool {
        let normalized = normalize_indicator(value);
        self.null_indicators.iter().any(|ind| *ind == normalized)
    }
}

/// Uppercase with all whitespace stripped, matching the source allow-list
/// comparison ("na n" and "NaN" are the same indicator).
fn normalize_indicator(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Spreadsheet integers arrive as floats; render `88.0` as `88`.
fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
