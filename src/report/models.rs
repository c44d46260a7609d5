use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::generator::BatchOutcome;

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct GeneratedFile {
    #[schema(example = "asha-kumar.pdf")]
    pub name: String,
    #[schema(example = "/reports/serve/f1e2d3c4-b5a6-7890-1234-567890abcdef/asha-kumar.pdf")]
    pub url: String,
}

/// One finished upload-and-generate run.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct BatchSummary {
    #[schema(example = "f1e2d3c4-b5a6-7890-1234-567890abcdef")]
    pub id: Uuid,
    #[schema(example = "Grade_7B")]
    pub class_name: String,
    #[schema(example = "./reports/grade-7b-report-cards")]
    pub output_dir: String,
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub files: Vec<GeneratedFile>,
    pub created_at: DateTime<Utc>,
}

impl BatchSummary {
    pub fn from_outcome(class_name: &str, outcome: &BatchOutcome) -> Self {
        let id = Uuid::new_v4();
        let files = outcome
            .reports
            .iter()
            .map(|report| GeneratedFile {
                name: report.filename.clone(),
                url: format!("/reports/serve/{}/{}", id, report.filename),
            })
            .collect();

        Self {
            id,
            class_name: class_name.to_string(),
            output_dir: outcome.output_dir.display().to_string(),
            total: outcome.total,
            succeeded: outcome.succeeded,
            skipped: outcome.skipped,
            failed: outcome.failed,
            files,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchListResponse {
    pub batches: Vec<BatchSummary>,
}
