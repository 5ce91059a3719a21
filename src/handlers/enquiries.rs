use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, PageParams};
use crate::database::models::{Enquiry, EnquiryStatus};
use crate::middleware::AuthSession;
use crate::services::enquiry_service::{self, NewEnquiry};
use crate::state::AppState;

/// POST /enquiries - public lead capture against a listing
pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewEnquiry>,
) -> ApiResult<Enquiry> {
    let enquiry = enquiry_service::create_enquiry(&state.pool, new).await?;
    Ok(ApiResponse::created(enquiry))
}

/// GET /api/enquiries - role-scoped listing (AGENT sees only its own rows)
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<Enquiry>> {
    let agent = session.require_agent()?;
    let (page, limit) = params.resolve()?;
    let (rows, total) = enquiry_service::list_enquiries(&state.pool, agent, page, limit).await?;
    Ok(ApiResponse::paginated(rows, page, limit, total))
}

#[derive(Debug, Deserialize)]
pub struct EnquiryStatusUpdate {
    pub status: EnquiryStatus,
}

/// PATCH /api/enquiries/:id - pipeline status change; first move to
/// CONTACTED stamps respondedAt, exactly once
pub async fn update(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(body): Json<EnquiryStatusUpdate>,
) -> ApiResult<Enquiry> {
    let agent = session.require_agent()?;
    let enquiry = enquiry_service::update_status(&state.pool, id, body.status, agent).await?;
    Ok(ApiResponse::success(enquiry))
}
