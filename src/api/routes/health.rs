use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::api::state::AppState;

pub const LANDING_PAGE: &str = "/static/zenti-final.html";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub port: u16,
    pub host: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub vector_store: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let server = &state.config.config.server;
    Json(HealthResponse {
        status: "healthy".into(),
        message: "Zenti AI Agent is running".into(),
        port: server.port,
        host: server.host.clone(),
    })
}

pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.rag_service.ensure_ready().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready".into(),
                vector_store: "connected".into(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "vector store not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready".into(),
                    vector_store: "disconnected".into(),
                }),
            )
        }
    }
}

pub async fn root_redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, LANDING_PAGE)])
}
