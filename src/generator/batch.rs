//! The per-record driver: one spreadsheet in, one PDF per student out.
//!
//! Processing is strictly sequential; the engine instance is shared across
//! records and is not safe for concurrent use. Run-level failures (unreadable
//! inputs, missing engine) abort before any output exists; record-level
//! failures are logged, counted, and skipped.

use std::path::{Path, PathBuf};

use log::{error, info, warn};

use super::common::{output_dir_name, sanitize_filename};
use super::engine::PdfEngine;
use super::extract::RowExtractor;
use super::mapping::ColumnMapping;
use super::record::RecordNormalizer;
use super::template::ReportTemplate;
use super::BatchError;

/// Tunables of one batch run; read from the environment by the service layer
/// and passed in as plain values.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub header_rows_to_skip: usize,
    pub placeholder_prefix: String,
    pub placeholder_suffix: String,
    pub default_null_value: String,
    pub null_indicators: Vec<String>,
    pub identity_key: String,
    pub class_key: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            header_rows_to_skip: 4,
            placeholder_prefix: "{{".to_string(),
            placeholder_suffix: "}}".to_string(),
            default_null_value: "---".to_string(),
            null_indicators: ["NAN", "NONE", "NA", "NULL"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            identity_key: "name".to_string(),
            class_key: "class".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub output_dir: PathBuf,
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub reports: Vec<GeneratedReport>,
}

pub struct BatchRunner<'e> {
    engine: &'e dyn PdfEngine,
    options: BatchOptions,
}

impl<'e> BatchRunner<'e> {
    pub fn new(engine: &'e dyn PdfEngine, options: BatchOptions) -> Self {
        Self { engine, options }
    }

    /// Run the whole pipeline. `progress` is invoked with
    /// `(current attempt, total rows, identifying value)` after each record
    /// attempt, successful or not.
    pub fn run(
        &self,
        spreadsheet: &Path,
        mapping_path: &Path,
        template_path: &Path,
        class_label: &str,
        output_root: &Path,
        progress: &mut dyn FnMut(usize, usize, &str),
    ) -> Result<BatchOutcome, BatchError> {
        let opts = &self.options;

        let mapping = ColumnMapping::load(mapping_path)?;
        let extractor = RowExtractor::open(spreadsheet, opts.header_rows_to_skip)?;
        let template = ReportTemplate::open(
            template_path,
            &opts.placeholder_prefix,
            &opts.placeholder_suffix,
        )?;

        if mapping.column_of(&opts.identity_key).is_none() {
            warn!(
                "mapping has no '{}' column; every row will be skipped",
                opts.identity_key
            );
        }

        let output_dir = output_root.join(output_dir_name(class_label));
        std::fs::create_dir_all(&output_dir).map_err(BatchError::OutputDir)?;

        let scratch = tempfile::tempdir().map_err(BatchError::Scratch)?;

        let normalizer = RecordNormalizer::new(
            &mapping,
            &opts.null_indicators,
            &opts.default_null_value,
            &opts.identity_key,
        )
        .with_class_field(&opts.class_key, class_label);

        let total = extractor.count();
        let mut outcome = BatchOutcome {
            output_dir: output_dir.clone(),
            total,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            reports: Vec::new(),
        };

        for (index, row) in extractor.rows().enumerate() {
            let attempt = index + 1;
            let record = match normalizer.normalize(attempt, row) {
                Ok(record) => record,
                Err(skip) => {
                    warn!("{skip}");
                    outcome.skipped += 1;
                    progress(attempt, total, &opts.default_null_value);
                    continue;
                }
            };

            let name = record.display_name().to_string();
            match self.render_one(&template, &record, scratch.path(), &output_dir) {
                Ok(report) => {
                    info!("generated {} for '{}'", report.filename, name);
                    outcome.succeeded += 1;
                    outcome.reports.push(report);
                }
                Err(e) => {
                    error!("failed to render report for '{}': {}", name, e);
                    outcome.failed += 1;
                }
            }
            progress(attempt, total, &name);
        }

        info!(
            "batch for '{}' done: {}/{} succeeded, {} skipped, {} failed",
            class_label, outcome.succeeded, outcome.total, outcome.skipped, outcome.failed
        );
        Ok(outcome)
    }

    fn render_one(
        &self,
        template: &ReportTemplate,
        record: &super::record::Record,
        scratch: &Path,
        output_dir: &Path,
    ) -> Result<GeneratedReport, super::RenderError> {
        let stem = sanitize_filename(record.display_name(), "student");
        let docx_path = scratch.join(format!("{stem}.docx"));

        template.fill(record, &docx_path)?;
        let pdf_path = self.engine.export_pdf(&docx_path, output_dir)?;

        let filename = pdf_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("report.pdf")
            .to_string();

        Ok(GeneratedReport {
            filename,
            path: pdf_path,
        })
    }
}
