use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::database::models::Deal;
use crate::services::deal_service::{self, DealDocumentKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub kind: DealDocumentKind,
    pub document: Value,
}

/// POST /api/n8n/deals/:id/documents - attach a generated invoice or
/// receipt to a deal. Structural merge into the metadata union: previously
/// stored keys are preserved, never overwritten wholesale.
pub async fn attach(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
    Json(body): Json<DocumentRequest>,
) -> ApiResult<Deal> {
    let deal =
        deal_service::attach_document(&state.pool, deal_id, body.kind, body.document).await?;
    Ok(ApiResponse::success(deal))
}
