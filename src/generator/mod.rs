//! Generator module - business logic for turning a spreadsheet plus a docx
//! template into one PDF per student record.
//!
//! The pipeline is split into small units:
//! - `mapping` - placeholder name → spreadsheet column association
//! - `extract` - raw row extraction from the workbook
//! - `record` - null handling and per-student record normalization
//! - `template` - placeholder substitution inside the docx body
//! - `engine` - the external PDF engine behind a narrow trait
//! - `batch` - the sequential per-record driver

pub mod batch;
pub mod common;
pub mod engine;
pub mod extract;
pub mod mapping;
pub mod record;
pub mod template;

pub use batch::{BatchOutcome, BatchRunner, GeneratedReport};
pub use engine::{PdfEngine, SofficeEngine};
pub use extract::RowExtractor;
pub use mapping::ColumnMapping;
pub use record::{Record, RecordNormalizer, SkippedRow};
pub use template::ReportTemplate;

use std::path::PathBuf;
use thiserror::Error;

/// Errors opening or reading the spreadsheet. Run-level: aborts the batch.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("failed to open spreadsheet: {0}")]
    Open(#[from] calamine::XlsxError),
    #[error("workbook contains no sheets")]
    NoSheets,
    #[error("no data rows left after skipping {skipped} header row(s)")]
    NoDataRows { skipped: usize },
}

/// Errors loading the placeholder → column mapping. Run-level.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read mapping file: {0}")]
    Io(#[from] std::io::Error),
    #[error("mapping file is not a flat JSON object of strings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("mapping file is empty")]
    Empty,
    #[error("column '{column}' for placeholder '{key}' is not a column letter")]
    InvalidColumn { key: String, column: String },
}

/// The external document engine could not be acquired. Run-level.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("LibreOffice not found; install it or set REPORT_SOFFICE_PATH")]
    NotFound,
    #[error("failed to create engine profile directory: {0}")]
    Profile(#[source] std::io::Error),
}

/// Per-record rendering failure. Logged and counted, never fatal to the run.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read template: {0}")]
    TemplateIo(#[source] std::io::Error),
    #[error("template is not a docx archive: {0}")]
    TemplateArchive(#[from] zip::result::ZipError),
    #[error("failed to parse document body: {0}")]
    DocumentXml(#[from] quick_xml::Error),
    #[error("failed to write filled document: {0}")]
    WriteFilled(#[source] std::io::Error),
    #[error("engine execution failed: {0}")]
    EngineIo(#[source] std::io::Error),
    #[error("engine exited with status {status}: {stderr}")]
    EngineExit { status: i32, stderr: String },
    #[error("engine timed out after {0} seconds")]
    Timeout(u64),
    #[error("engine produced no PDF at {}", .0.display())]
    MissingOutput(PathBuf),
}

/// Run-level failure of a whole batch. Record-level failures never surface
/// here; they are counted in the batch outcome instead.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("template check failed: {0}")]
    Template(#[from] RenderError),
    #[error("failed to create output directory: {0}")]
    OutputDir(#[source] std::io::Error),
    #[error("failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),
}
