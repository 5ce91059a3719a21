use axum::{
    extract::{Query, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, PageParams};
use crate::database::models::{AgentRole, PropertySubmission};
use crate::error::ApiError;
use crate::middleware::AuthSession;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub asking_price: Option<Decimal>,
}

/// POST /submissions - unauthenticated property intake, always PENDING.
/// Promotion to a real listing happens later through the agent dashboard.
pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewSubmission>,
) -> ApiResult<PropertySubmission> {
    if new.contact_name.trim().is_empty() {
        return Err(ApiError::validation("contactName is required"));
    }
    if !new.contact_email.contains('@') {
        return Err(ApiError::validation("a valid contactEmail is required"));
    }
    if new.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }

    let submission = sqlx::query_as::<_, PropertySubmission>(
        r#"
        INSERT INTO property_submissions
            (id, contact_name, contact_email, contact_phone, title,
             description, address, city, asking_price, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'PENDING', NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.contact_name.trim())
    .bind(new.contact_email.trim())
    .bind(&new.contact_phone)
    .bind(new.title.trim())
    .bind(&new.description)
    .bind(&new.address)
    .bind(&new.city)
    .bind(new.asking_price)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(submission_id = %submission.id, "property submission received");
    Ok(ApiResponse::created(submission))
}

/// GET /api/submissions - platform staff review queue
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<PropertySubmission>> {
    session.require_role(&[AgentRole::SuperAdmin, AgentRole::PlatformAgent])?;

    let (page, limit) = params.resolve()?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM property_submissions")
        .fetch_one(&state.pool)
        .await?;
    let rows = sqlx::query_as::<_, PropertySubmission>(
        "SELECT * FROM property_submissions ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::paginated(rows, page, limit, total))
}
