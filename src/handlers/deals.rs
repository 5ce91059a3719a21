use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, PageParams};
use crate::database::models::Deal;
use crate::middleware::AuthSession;
use crate::services::deal_service::{self, DealPatch, NewDeal};
use crate::state::AppState;

/// GET /api/deals - role-scoped pipeline listing
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<Deal>> {
    let agent = session.require_agent()?;
    let scope = if agent.role.is_internal() { None } else { Some(agent.id) };

    let (page, limit) = params.resolve()?;
    let (rows, total) = deal_service::list_deals(&state.pool, scope, page, limit).await?;
    Ok(ApiResponse::paginated(rows, page, limit, total))
}

/// POST /api/deals - open a deal against a property
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(new): Json<NewDeal>,
) -> ApiResult<Deal> {
    let agent = session.require_agent()?;
    let deal = deal_service::create_deal(&state.pool, new, agent).await?;
    Ok(ApiResponse::created(deal))
}

/// PATCH /api/deals/:id - update a deal; a stage change also refreshes the
/// owning property's verification in the same transaction
pub async fn update(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(patch): Json<DealPatch>,
) -> ApiResult<Deal> {
    let agent = session.require_agent()?;
    let deal = deal_service::update_deal(&state.pool, id, patch, agent).await?;
    Ok(ApiResponse::success(deal))
}
