use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::routes::error_status;
use crate::api::state::AppState;
use crate::domain::{Document, SiteFilter};

pub const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub url: String,
    pub name: String,
    pub site: String,
    pub schema_object: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct CreateDocumentResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SearchDocumentsRequest {
    pub query: String,
    pub site: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultResponse {
    pub url: String,
    pub name: String,
    pub site: String,
    pub score: f32,
    pub schema_object: serde_json::Value,
}

pub async fn create_document(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<CreateDocumentResponse>), StatusCode> {
    let document = Document::new(request.url, request.name, request.site, request.schema_object);

    match state.rag_service.index_document(&document).await {
        Ok(id) => Ok((StatusCode::CREATED, Json(CreateDocumentResponse { id }))),
        Err(e) => {
            tracing::error!(error = %e, name = %document.name, "Failed to index document");
            Err(error_status(&e))
        }
    }
}

/// Unlike the answer path, a backend failure here is reported to the caller
/// instead of looking like an empty result.
pub async fn search_documents(
    State(state): State<AppState>,
    Json(request): Json<SearchDocumentsRequest>,
) -> Result<Json<Vec<SearchResultResponse>>, StatusCode> {
    if request.query.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let site = SiteFilter::parse(request.site.as_deref());
    let limit = request
        .limit
        .unwrap_or(state.rag_service.default_top_k())
        .min(MAX_SEARCH_LIMIT);

    match state
        .rag_service
        .retrieve_top_k(&request.query, &site, limit)
        .await
    {
        Ok(hits) => Ok(Json(
            hits.into_iter()
                .map(|hit| SearchResultResponse {
                    url: hit.document.url,
                    name: hit.document.name,
                    site: hit.document.site,
                    score: hit.score,
                    schema_object: hit.document.payload,
                })
                .collect(),
        )),
        Err(e) => {
            tracing::error!(error = %e, "Search failed");
            Err(error_status(&e))
        }
    }
}
