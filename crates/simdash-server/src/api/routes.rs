//! Route handlers and router assembly.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::api::model::{ApiExportModel, ApiSourceModel};
use crate::error::ServerResult;
use crate::generator::GeneratorService;
use crate::metadata::AppMetadata;
use crate::notices::NoticesContainer;
use crate::resources::{ResourceProvider, SAMPLE_EXPORT_MODEL_FILE};
use crate::settings::Settings;
use crate::source_model::SourceModelService;

/// Shared immutable state; everything is loaded once at startup.
pub struct AppState {
    pub source: SourceModelService,
    pub generator: GeneratorService,
    pub notices: NoticesContainer,
    pub metadata: AppMetadata,
    pub sample_model_json: String,
}

impl AppState {
    pub fn load(settings: &Settings) -> ServerResult<AppState> {
        let resources = ResourceProvider::new(&settings.resources_dir);
        let metadata = AppMetadata::collect();
        let source = SourceModelService::load(&resources)?;
        let generator = GeneratorService::load(
            &resources,
            &settings.app_title,
            &metadata.display_version(),
        )?;
        let notices = NoticesContainer::load(&resources)?;
        let sample_model_json = resources.read_sample_export_model_file(SAMPLE_EXPORT_MODEL_FILE)?;
        Ok(AppState {
            source,
            generator,
            notices,
            metadata,
            sample_model_json,
        })
    }
}

pub fn build_router(state: Arc<AppState>, settings: &Settings) -> Router {
    let mut router = Router::new()
        .route("/api/source-model", get(get_source_model))
        .route("/api/generate", post(post_generate))
        .route("/api/sample-model", get(get_sample_model))
        .route("/api/notices", get(get_notices))
        .route("/api/metadata", get(get_metadata));

    router = match &settings.static_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "serving static frontend");
            router.fallback_service(ServeDir::new(dir))
        }
        None => router.route("/", get(|| async { "Hello World!" })),
    };

    router.layer(CorsLayer::permissive()).with_state(state)
}

async fn get_source_model(State(state): State<Arc<AppState>>) -> Json<ApiSourceModel> {
    Json(state.source.catalog())
}

async fn post_generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ApiExportModel>,
) -> ServerResult<Response> {
    let bundle = state.generator.generate(&request, &state.source)?;
    let disposition = format!("attachment; filename=\"{}\"", bundle.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bundle.zip_bytes,
    )
        .into_response())
}

async fn get_sample_model(State(state): State<Arc<AppState>>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.sample_model_json.clone(),
    )
        .into_response()
}

async fn get_notices(State(state): State<Arc<AppState>>) -> Json<NoticesContainer> {
    Json(state.notices.clone())
}

async fn get_metadata(State(state): State<Arc<AppState>>) -> Json<AppMetadata> {
    Json(state.metadata.clone())
}
