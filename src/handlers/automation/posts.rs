use axum::{extract::State, Json};

use crate::api::response::{ApiResponse, ApiResult};
use crate::database::models::Post;
use crate::services::content_service::{self, NewPost};
use crate::state::AppState;

/// POST /api/n8n/posts - create a content post. Slug is derived from the
/// title with a uniqueness suffix on collision; defaults to DRAFT unless
/// the payload asks to publish.
pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewPost>,
) -> ApiResult<Post> {
    let post = content_service::create_post(&state.pool, new).await?;
    Ok(ApiResponse::created(post))
}
