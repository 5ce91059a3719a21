use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{AgentProfile, Enquiry, EnquiryStatus};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnquiry {
    pub property_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// Public lead capture. The enquiry is routed to the listing's agent when
/// the property has one.
pub async fn create_enquiry(pool: &PgPool, new: NewEnquiry) -> Result<Enquiry, ApiError> {
    if new.name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    if !new.email.contains('@') {
        return Err(ApiError::validation("a valid email is required"));
    }

    let agent_id: Option<Uuid> =
        sqlx::query_scalar("SELECT agent_id FROM properties WHERE id = $1")
            .bind(new.property_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(format!("Property {} not found", new.property_id))
            })?;

    let enquiry = sqlx::query_as::<_, Enquiry>(
        r#"
        INSERT INTO enquiries
            (id, property_id, agent_id, name, email, phone, message,
             status, responded_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'NEW', NULL, NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.property_id)
    .bind(agent_id)
    .bind(new.name.trim())
    .bind(new.email.trim())
    .bind(&new.phone)
    .bind(&new.message)
    .fetch_one(pool)
    .await?;

    tracing::info!(enquiry_id = %enquiry.id, property_id = %enquiry.property_id, "enquiry captured");
    Ok(enquiry)
}

/// Role-scoped listing: internal roles see everything, an AGENT sees only
/// rows assigned to them.
pub async fn list_enquiries(
    pool: &PgPool,
    actor: &AgentProfile,
    page: i64,
    limit: i64,
) -> Result<(Vec<Enquiry>, i64), ApiError> {
    if actor.role.is_internal() {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enquiries")
            .fetch_one(pool)
            .await?;
        let rows = sqlx::query_as::<_, Enquiry>(
            "SELECT * FROM enquiries ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(pool)
        .await?;
        Ok((rows, total))
    } else {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM enquiries WHERE agent_id = $1")
                .bind(actor.id)
                .fetch_one(pool)
                .await?;
        let rows = sqlx::query_as::<_, Enquiry>(
            "SELECT * FROM enquiries WHERE agent_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(actor.id)
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(pool)
        .await?;
        Ok((rows, total))
    }
}

/// Move an enquiry through its pipeline. `responded_at` is written exactly
/// once: the first transition to CONTACTED stamps it, later updates leave
/// the original timestamp alone.
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: EnquiryStatus,
    actor: &AgentProfile,
) -> Result<Enquiry, ApiError> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Enquiry>("SELECT * FROM enquiries WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Enquiry {} not found", id)))?;

    if !actor.role.is_internal() && current.agent_id != Some(actor.id) {
        return Err(ApiError::forbidden("Enquiry belongs to another agent"));
    }

    let enquiry = sqlx::query_as::<_, Enquiry>(
        r#"
        UPDATE enquiries SET
            status = $2,
            responded_at = CASE
                WHEN $2 = 'CONTACTED'::enquiry_status THEN COALESCE(responded_at, NOW())
                ELSE responded_at
            END
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(enquiry_id = %enquiry.id, agent_id = %actor.id, "enquiry status updated");
    Ok(enquiry)
}
