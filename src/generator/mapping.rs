//! Placeholder → spreadsheet column mapping.
//!
//! The mapping file is a flat JSON object whose keys are placeholder names and
//! whose values are spreadsheet column letters, e.g.
//! `{"name": "A", "math": "B", "remark": "AA"}`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::MappingError;

/// Convert a column letter (`A`, `B`, .., `AA`, ..) to a 0-based index.
///
/// Returns `None` for anything that is not a pure letter sequence.
pub fn column_letter_to_index(letter: &str) -> Option<usize> {
    let trimmed = letter.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut index: usize = 0;
    for ch in trimmed.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(index - 1)
}

/// Loaded once per batch, read-only afterwards.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    entries: Vec<(String, usize)>,
}

impl ColumnMapping {
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let raw = fs::read_to_string(path)?;
        let pairs: BTreeMap<String, String> = serde_json::from_str(&raw)?;
        Self::from_pairs(pairs)
    }

    pub fn from_pairs<I>(pairs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut entries = Vec::new();
        for (key, column) in pairs {
            let index = column_letter_to_index(&column)
                .ok_or_else(|| MappingError::InvalidColumn {
                    key: key.clone(),
                    column: column.clone(),
                })?;
            entries.push((key, index));
        }

        if entries.is_empty() {
            return Err(MappingError::Empty);
        }

        Ok(Self { entries })
    }

    /// (placeholder name, 0-based column index) pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(key, idx)| (key.as_str(), *idx))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn column_of(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, idx)| *idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
