use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod generator;
pub mod report;
pub mod state;
pub mod storage;

pub use crate::state::AppState;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

pub async fn run() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::report::handlers::generate_reports,
            crate::report::handlers::get_all_batches,
            crate::report::handlers::get_batch_by_id,
        ),
        components(
            schemas(
                report::models::BatchSummary,
                report::models::GeneratedFile,
                report::models::BatchListResponse,
                report::handlers::GenerateReportsRequest,
                ErrorResponse,
            )
        ),
        tags(
            (name = "Report Service", description = "Report card batch endpoints.")
        ),
        servers(
            (url = "http://127.0.0.1:8080", description = "Localhost server")
        )
    )]
    struct ApiDoc;

    let settings = config::Settings::from_env();
    if let Err(e) = storage::ensure_output_root(&settings.output_dir) {
        log::error!(
            "Failed to create output root '{}': {}",
            settings.output_dir.display(),
            e
        );
        std::process::exit(1);
    }

    let app_state = web::Data::new(AppState::new(settings));

    log::info!("Starting server at http://0.0.0.0:8080");

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let cors = Cors::default()
            .allowed_origin("http://localhost:8080")
            .allowed_origin("http://127.0.0.1:8080")
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(cors)
            .app_data(app_state)
            .service(
                web::scope("/api")
                    .service(
                        web::resource("/reports")
                            .route(web::get().to(report::handlers::get_all_batches))
                            .route(web::post().to(report::handlers::generate_reports)),
                    )
                    .service(
                        web::resource("/reports/{id}")
                            .route(web::get().to(report::handlers::get_batch_by_id)),
                    ),
            )
            .service(
                web::resource("/reports/serve/{batch_id}/{filename:.*}")
                    .route(web::get().to(report::handlers::serve_report)),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .service(actix_files::Files::new("/", "./static").index_file("index.html"))
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}
