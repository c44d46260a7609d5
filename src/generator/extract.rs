//! Raw row extraction from the spreadsheet.
//!
//! Reads the first sheet of an `.xlsx` workbook, skips the configured number
//! of leading header rows, and exposes the remaining rows as a restartable
//! iterator. Fully empty rows (trailing padding is common in exported class
//! sheets) are dropped.

use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};

use super::DataSourceError;

pub struct RowExtractor {
    range: Range<Data>,
    header_rows_to_skip: usize,
}

impl RowExtractor {
    pub fn open(path: &Path, header_rows_to_skip: usize) -> Result<Self, DataSourceError> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(DataSourceError::NoSheets)?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let extractor = Self {
            range,
            header_rows_to_skip,
        };
        if extractor.count() == 0 {
            return Err(DataSourceError::NoDataRows {
                skipped: header_rows_to_skip,
            });
        }

        Ok(extractor)
    }

    /// Data rows, after the header skip, without fully empty rows.
    ///
    /// The parsed range lives in memory, so the sequence can be restarted by
    /// calling this again.
    pub fn rows(&self) -> impl Iterator<Item = &[Data]> {
        self.range
            .rows()
            .skip(self.header_rows_to_skip)
            .filter(|row| !row_is_empty(row))
    }

    pub fn count(&self) -> usize {
        self.rows().count()
    }

    pub fn width(&self) -> usize {
        self.range.width()
    }
}

fn row_is_empty(row: &[Data]) -> bool {
    row.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    })
}
