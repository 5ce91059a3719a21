use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{AgentProfile, Deal};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeal {
    pub property_id: Uuid,
    pub stage: String,
    pub amount: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub lease_start: Option<NaiveDate>,
    pub lease_end: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealPatch {
    pub stage: Option<String>,
    pub amount: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub lease_start: Option<NaiveDate>,
    pub lease_end: Option<NaiveDate>,
}

/// Sub-documents the automation gateway may attach to a deal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealDocumentKind {
    Invoice,
    Receipt,
}

impl DealDocumentKind {
    pub fn key(self) -> &'static str {
        match self {
            DealDocumentKind::Invoice => "invoice",
            DealDocumentKind::Receipt => "receipt",
        }
    }
}

pub async fn list_deals(
    pool: &PgPool,
    agent_scope: Option<Uuid>,
    page: i64,
    limit: i64,
) -> Result<(Vec<Deal>, i64), ApiError> {
    let (deals, total) = match agent_scope {
        Some(agent_id) => {
            let total: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM deals WHERE agent_id = $1")
                    .bind(agent_id)
                    .fetch_one(pool)
                    .await?;
            let rows = sqlx::query_as::<_, Deal>(
                "SELECT * FROM deals WHERE agent_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            )
            .bind(agent_id)
            .bind(limit)
            .bind((page - 1) * limit)
            .fetch_all(pool)
            .await?;
            (rows, total)
        }
        None => {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deals")
                .fetch_one(pool)
                .await?;
            let rows = sqlx::query_as::<_, Deal>(
                "SELECT * FROM deals ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind((page - 1) * limit)
            .fetch_all(pool)
            .await?;
            (rows, total)
        }
    };
    Ok((deals, total))
}

pub async fn create_deal(
    pool: &PgPool,
    new: NewDeal,
    actor: &AgentProfile,
) -> Result<Deal, ApiError> {
    // Reject deals against unknown properties up front
    let property_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM properties WHERE id = $1)")
            .bind(new.property_id)
            .fetch_one(pool)
            .await?;
    if !property_exists {
        return Err(ApiError::not_found(format!(
            "Property {} not found",
            new.property_id
        )));
    }

    let deal = sqlx::query_as::<_, Deal>(
        r#"
        INSERT INTO deals
            (id, property_id, agent_id, stage, amount, deposit,
             lease_start, lease_end, metadata, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, '{}'::jsonb, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.property_id)
    .bind(actor.id)
    .bind(&new.stage)
    .bind(new.amount)
    .bind(new.deposit)
    .bind(new.lease_start)
    .bind(new.lease_end)
    .fetch_one(pool)
    .await?;

    tracing::info!(deal_id = %deal.id, property_id = %deal.property_id, "deal created");
    Ok(deal)
}

/// Update a deal. A stage change also refreshes the owning property's
/// verification (source SYSTEM) in the same transaction: if the property
/// update fails, the stage change rolls back with it.
pub async fn update_deal(
    pool: &PgPool,
    id: Uuid,
    patch: DealPatch,
    actor: &AgentProfile,
) -> Result<Deal, ApiError> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Deal>("SELECT * FROM deals WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Deal {} not found", id)))?;

    if !actor.role.is_internal() && current.agent_id != Some(actor.id) {
        return Err(ApiError::forbidden("Deal belongs to another agent"));
    }

    let next_stage = patch.stage.clone().unwrap_or_else(|| current.stage.clone());
    let stage_changed = next_stage != current.stage;

    let deal = sqlx::query_as::<_, Deal>(
        r#"
        UPDATE deals SET
            stage = $2,
            amount = $3,
            deposit = $4,
            lease_start = $5,
            lease_end = $6,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&next_stage)
    .bind(patch.amount.or(current.amount))
    .bind(patch.deposit.or(current.deposit))
    .bind(patch.lease_start.or(current.lease_start))
    .bind(patch.lease_end.or(current.lease_end))
    .fetch_one(&mut *tx)
    .await?;

    if stage_changed {
        let updated = sqlx::query(
            r#"
            UPDATE properties SET
                last_verified_at = GREATEST(COALESCE(last_verified_at, 'epoch'::timestamptz), NOW()),
                verification_source = 'SYSTEM',
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(deal.property_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Orphaned deal: fail the whole operation rather than leave the
            // stage changed without the freshness refresh
            return Err(ApiError::internal(format!(
                "property {} missing for deal {}",
                deal.property_id, deal.id
            )));
        }
    }

    tx.commit().await?;

    tracing::info!(
        deal_id = %deal.id,
        property_id = %deal.property_id,
        stage = %deal.stage,
        stage_changed,
        "deal updated"
    );
    Ok(deal)
}

/// Merge an automation-supplied document into a deal's metadata and persist
/// it. Row-locked so concurrent merges cannot drop each other's keys.
pub async fn attach_document(
    pool: &PgPool,
    deal_id: Uuid,
    kind: DealDocumentKind,
    document: Value,
) -> Result<Deal, ApiError> {
    if !document.is_object() {
        return Err(ApiError::validation("document must be a JSON object"));
    }

    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Deal>("SELECT * FROM deals WHERE id = $1 FOR UPDATE")
        .bind(deal_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Deal {} not found", deal_id)))?;

    let merged = merge_metadata(&current.metadata, kind.key(), &document);

    let deal = sqlx::query_as::<_, Deal>(
        "UPDATE deals SET metadata = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(deal_id)
    .bind(&merged)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(deal_id = %deal.id, kind = kind.key(), "document attached to deal");
    Ok(deal)
}

/// Structural merge: the named sub-document is shallow-merged key-wise into
/// `metadata[kind]`; every other top-level metadata key is preserved.
pub fn merge_metadata(existing: &Value, kind: &str, document: &Value) -> Value {
    let mut root = match existing {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    let mut sub = match root.get(kind) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    if let Value::Object(incoming) = document {
        for (k, v) in incoming {
            sub.insert(k.clone(), v.clone());
        }
    }

    root.insert(kind.to_string(), Value::Object(sub));
    Value::Object(root)
}
