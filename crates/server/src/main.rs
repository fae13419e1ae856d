use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use server_api::{
    create_document, delete_document, get_document, list_documents, update_document, ApiContext,
};
use shared::{
    domain::{Document, DocumentDraft, DocumentId},
    error::{ApiError, ErrorCode},
    protocol::{
        document_route, CreateDocumentResponse, MessageResponse, DOCUMENTS_ROUTE, DOCUMENT_ROUTE,
    },
};
use storage::Storage;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_database_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

type ApiFailure = (StatusCode, Json<ApiError>);
type ApiResult<T> = Result<Json<T>, ApiFailure>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify the path and its permissions"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "document service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("document service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
    }
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            DOCUMENTS_ROUTE,
            get(http_list_documents).post(http_create_document),
        )
        .route(
            DOCUMENT_ROUTE,
            get(http_get_document)
                .put(http_update_document)
                .delete(http_delete_document),
        )
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        error!(%error, "storage health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

async fn http_list_documents(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Document>> {
    list_documents(&state.api)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn http_get_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> ApiResult<Document> {
    get_document(&state.api, &DocumentId::new(document_id))
        .await
        .map(Json)
        .map_err(error_response)
}

async fn http_create_document(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<DocumentDraft>,
) -> Result<([(header::HeaderName, String); 1], Json<CreateDocumentResponse>), ApiFailure> {
    let created = create_document(&state.api, draft)
        .await
        .map_err(error_response)?;
    let location = document_route(&created.id);
    Ok(([(header::LOCATION, location)], Json(created)))
}

async fn http_update_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    Json(draft): Json<DocumentDraft>,
) -> ApiResult<MessageResponse> {
    update_document(&state.api, &DocumentId::new(document_id), draft)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn http_delete_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> ApiResult<MessageResponse> {
    delete_document(&state.api, &DocumentId::new(document_id))
        .await
        .map(Json)
        .map_err(error_response)
}

fn error_response(err: ApiError) -> ApiFailure {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::Internal => {
            error!(message = %err.message, "document request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
