use actix_multipart::Multipart;
use actix_web::{
    web::{self, Path as WebPath},
    HttpRequest, HttpResponse, Responder,
};
use futures::TryStreamExt;
use log::{debug, error, info};
use sanitize_filename::sanitize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

use crate::generator::{BatchError, BatchRunner, SofficeEngine};
use crate::report::models::{BatchListResponse, BatchSummary};
use crate::state::AppState;
use crate::storage;
use crate::ErrorResponse;

/// The three uploaded input files plus the class label, spooled to a scratch
/// directory that lives until the batch finishes.
struct UploadedJob {
    dir: TempDir,
    spreadsheet: Option<PathBuf>,
    mapping: Option<PathBuf>,
    template: Option<PathBuf>,
    class_name: Option<String>,
}

async fn collect_job_parts(mut payload: Multipart) -> Result<UploadedJob, String> {
    let dir = tempfile::tempdir().map_err(|e| format!("Failed to create upload directory: {e}"))?;
    let mut job = UploadedJob {
        dir,
        spreadsheet: None,
        mapping: None,
        template: None,
        class_name: None,
    };

    while let Some(mut field) = payload.try_next().await.map_err(|e| e.to_string())? {
        let (field_name, file_name) = {
            let content_disposition = field
                .content_disposition()
                .ok_or("Content-Disposition not set")?;
            (
                content_disposition
                    .get_name()
                    .ok_or_else(|| "No field name".to_string())?
                    .to_string(),
                content_disposition.get_filename().map(str::to_string),
            )
        };

        match field_name.as_str() {
            "spreadsheet" | "mapping" | "template" => {
                let fallback = match field_name.as_str() {
                    "spreadsheet" => "spreadsheet.xlsx",
                    "mapping" => "mapping.json",
                    _ => "template.docx",
                };
                let mut name = file_name.map(|n| sanitize(&n)).unwrap_or_default();
                if name.is_empty() {
                    name = fallback.to_string();
                }

                let path = job.dir.path().join(name);
                spool_field(&mut field, &path).await?;

                match field_name.as_str() {
                    "spreadsheet" => job.spreadsheet = Some(path),
                    "mapping" => job.mapping = Some(path),
                    _ => job.template = Some(path),
                }
            }
            "class_name" => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.try_next().await.map_err(|e| e.to_string())? {
                    bytes.extend_from_slice(&chunk);
                }
                let value = String::from_utf8(bytes).map_err(|e| e.to_string())?;
                let value = value.trim().to_string();
                if !value.is_empty() {
                    job.class_name = Some(value);
                }
            }
            _ => {
                continue;
            }
        }
    }

    Ok(job)
}

async fn spool_field(field: &mut actix_multipart::Field, path: &Path) -> Result<(), String> {
    let mut file =
        std::fs::File::create(path).map_err(|e| format!("Failed to create upload file: {e}"))?;
    while let Some(chunk) = field.try_next().await.map_err(|e| e.to_string())? {
        file.write_all(&chunk)
            .map_err(|e| format!("Failed to write upload chunk: {e}"))?;
    }
    Ok(())
}

fn batch_error_response(error: BatchError) -> HttpResponse {
    error!("batch aborted: {error}");
    match &error {
        BatchError::Engine(_) => HttpResponse::ServiceUnavailable()
            .json(ErrorResponse::new("EngineUnavailable", &error.to_string())),
        BatchError::DataSource(_) | BatchError::Mapping(_) | BatchError::Template(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(&error.to_string()))
        }
        BatchError::OutputDir(_) | BatchError::Scratch(_) => HttpResponse::InternalServerError()
            .json(ErrorResponse::internal_error(&error.to_string())),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Report Service",
    post,
    path = "/reports",
    request_body(content = inline(GenerateReportsRequest), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Batch generated", body = BatchSummary),
        (status = 400, description = "Invalid request or unreadable input", body = ErrorResponse),
        (status = 503, description = "PDF engine unavailable", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn generate_reports(payload: Multipart, data: web::Data<AppState>) -> impl Responder {
    info!("Executing generate_reports handler");
    debug!("Collecting multipart parts for report batch.");

    let job = match collect_job_parts(payload).await {
        Ok(job) => job,
        Err(e) => {
            error!("Failed to read multipart payload: {e}");
            return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e));
        }
    };

    let (Some(spreadsheet), Some(mapping), Some(template), Some(class_name)) = (
        job.spreadsheet.clone(),
        job.mapping.clone(),
        job.template.clone(),
        job.class_name.clone(),
    ) else {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(
            "Expected parts: spreadsheet, mapping, template, class_name",
        ));
    };

    let settings = data.settings.clone();
    let class = class_name.clone();
    let result = web::block(move || {
        // The scratch dir with the uploaded files must outlive the run.
        let _uploads = &job.dir;

        let engine =
            SofficeEngine::acquire(settings.soffice_path.as_deref(), settings.engine_timeout())
                .map_err(BatchError::Engine)?;
        info!("PDF engine acquired: {}", engine.binary().display());

        let runner = BatchRunner::new(&engine, settings.batch_options());
        let mut progress = |current: usize, total: usize, name: &str| {
            info!("[{current}/{total}] processed '{name}'");
        };
        runner.run(
            &spreadsheet,
            &mapping,
            &template,
            &class,
            &settings.output_dir,
            &mut progress,
        )
    })
    .await;

    match result {
        Err(e) => {
            error!("Report batch task failed: {e}");
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Report batch task failed"))
        }
        Ok(Err(batch_error)) => batch_error_response(batch_error),
        Ok(Ok(outcome)) => {
            let summary = BatchSummary::from_outcome(&class_name, &outcome);
            info!(
                "Batch {} stored: {}/{} reports for class '{}'",
                summary.id, summary.succeeded, summary.total, summary.class_name
            );
            data.insert_batch(summary.clone());
            HttpResponse::Created().json(summary)
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Report Service",
    get,
    path = "/reports",
    responses(
        (status = 200, description = "All known batches", body = BatchListResponse)
    )
)]
pub async fn get_all_batches(data: web::Data<AppState>) -> impl Responder {
    info!("Executing get_all_batches handler");
    HttpResponse::Ok().json(BatchListResponse {
        batches: data.all_batches(),
    })
}

#[utoipa::path(
    context_path = "/api",
    tag = "Report Service",
    get,
    path = "/reports/{id}",
    params(("id" = Uuid, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Batch found", body = BatchSummary),
        (status = 404, description = "Batch not found", body = ErrorResponse)
    )
)]
pub async fn get_batch_by_id(id: WebPath<Uuid>, data: web::Data<AppState>) -> impl Responder {
    let id = id.into_inner();
    info!("Executing get_batch_by_id handler for {id}");
    match data.get_batch(&id) {
        Some(summary) => HttpResponse::Ok().json(summary),
        None => HttpResponse::NotFound()
            .json(ErrorResponse::not_found(&format!("Batch '{id}' not found"))),
    }
}

pub async fn serve_report(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    let batch_id: String = req.match_info().query("batch_id").into();
    let filename: String = req.match_info().query("filename").into();
    info!("Executing serve_report handler for {batch_id}/{filename}");

    let Ok(id) = Uuid::parse_str(&batch_id) else {
        return HttpResponse::NotFound().json(ErrorResponse::not_found("Unknown batch id"));
    };
    let Some(summary) = data.get_batch(&id) else {
        return HttpResponse::NotFound()
            .json(ErrorResponse::not_found(&format!("Batch '{id}' not found")));
    };

    let batch_dir = PathBuf::from(&summary.output_dir);
    match storage::resolve_pdf(&batch_dir, &filename) {
        Some(path) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            match std::fs::read(&path) {
                Ok(bytes) => HttpResponse::Ok()
                    .content_type(mime.as_ref())
                    .body(bytes),
                Err(e) => {
                    error!("Failed to read report '{}': {}", path.display(), e);
                    HttpResponse::InternalServerError()
                        .json(ErrorResponse::internal_error("Failed to read report"))
                }
            }
        }
        None => {
            error!("Report not found for serving: {batch_id}/{filename}");
            HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                "Report '{filename}' not found"
            )))
        }
    }
}

/// Multipart form documented for Swagger; the handler reads the raw payload.
#[derive(Debug, utoipa::ToSchema)]
#[allow(dead_code)]
pub struct GenerateReportsRequest {
    #[schema(value_type = String, format = Binary)]
    pub spreadsheet: String,
    #[schema(value_type = String, format = Binary)]
    pub mapping: String,
    #[schema(value_type = String, format = Binary)]
    pub template: String,
    #[schema(example = "Grade_7B")]
    pub class_name: String,
}
