use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::{
    AgentProfile, ListingType, PriceChangeType, PriceHistory, Property, PropertyStatus,
    VerificationSource,
};
use crate::error::ApiError;

/// Status lifecycle rules:
/// - any state may return to AVAILABLE via a verification action
/// - AVAILABLE/PENDING may move to PENDING, SOLD or RENTED
/// - SOLD/RENTED are terminal until re-verified back to AVAILABLE
pub fn validate_status_change(
    current: PropertyStatus,
    next: PropertyStatus,
) -> Result<(), ApiError> {
    use PropertyStatus::*;
    let allowed = match (current, next) {
        (c, n) if c == n => true,
        (_, Available) => true,
        (Available | Pending, Pending | Sold | Rented) => true,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "Invalid status transition {} -> {}",
            current.as_str(),
            next.as_str()
        )))
    }
}

/// The two inputs the public verification link accepts. Everything else is
/// a 400 Invalid Action and performs no mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyAction {
    Available,
    Sold,
}

impl VerifyAction {
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "AVAILABLE" => Ok(VerifyAction::Available),
            "SOLD" => Ok(VerifyAction::Sold),
            other => Err(ApiError::validation(format!("Invalid action: {}", other))),
        }
    }

    pub fn status(self) -> PropertyStatus {
        match self {
            VerifyAction::Available => PropertyStatus::Available,
            VerifyAction::Sold => PropertyStatus::Sold,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub title: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub listing_type: ListingType,
    pub price: Decimal,
    pub rent_price: Option<Decimal>,
    pub agent_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub status: Option<PropertyStatus>,
    pub listing_type: Option<ListingType>,
    pub price: Option<Decimal>,
    /// Absent means "leave unchanged", an explicit `null` clears the rent
    /// (a listing switched from BOTH to SALE must be able to drop it)
    #[serde(default, deserialize_with = "double_option")]
    pub rent_price: Option<Option<Decimal>>,
    pub agent_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

// Maps a present-but-null JSON field to Some(None) instead of None, so the
// patch can tell "not sent" apart from "clear it"
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(de).map(Some)
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListFilters {
    pub status: Option<PropertyStatus>,
    pub listing_type: Option<ListingType>,
    pub city: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Restrict to one agent's rows (set for non-internal callers)
    pub agent_scope: Option<Uuid>,
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &ListFilters) {
    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(listing_type) = filters.listing_type {
        qb.push(" AND listing_type = ").push_bind(listing_type);
    }
    if let Some(city) = &filters.city {
        qb.push(" AND city ILIKE ").push_bind(format!("%{}%", city));
    }
    if let Some(min) = filters.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filters.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some(agent_id) = filters.agent_scope {
        qb.push(" AND agent_id = ").push_bind(agent_id);
    }
}

pub async fn list_properties(
    pool: &PgPool,
    filters: &ListFilters,
    page: i64,
    limit: i64,
) -> Result<(Vec<Property>, i64), ApiError> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM properties WHERE 1=1");
    apply_filters(&mut count_qb, filters);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new("SELECT * FROM properties WHERE 1=1");
    apply_filters(&mut qb, filters);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind((page - 1) * limit);
    let rows = qb.build_query_as::<Property>().fetch_all(pool).await?;

    Ok((rows, total))
}

pub async fn get_property(pool: &PgPool, id: Uuid) -> Result<Property, ApiError> {
    sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Property {} not found", id)))
}

/// Insert a property together with its initial CREATED price-history row.
/// One transaction: a property without an audit trail must not exist.
pub async fn create_property(
    pool: &PgPool,
    new: NewProperty,
    changed_by: &str,
) -> Result<Property, ApiError> {
    validate_price(new.price)?;
    if let Some(rent) = new.rent_price {
        validate_price(rent)?;
    }

    let mut tx = pool.begin().await?;

    let property = sqlx::query_as::<_, Property>(
        r#"
        INSERT INTO properties
            (id, title, description, address, city, postal_code, lat, lng,
             status, listing_type, price, rent_price,
             last_verified_at, verification_source, agent_id, project_id,
             created_at, updated_at)
        VALUES
            ($1, $2, $3, $4, $5, $6, $7, $8,
             'AVAILABLE', $9, $10, $11,
             NOW(), 'AGENT', $12, $13,
             NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.address)
    .bind(&new.city)
    .bind(&new.postal_code)
    .bind(new.lat)
    .bind(new.lng)
    .bind(new.listing_type)
    .bind(new.price)
    .bind(new.rent_price)
    .bind(new.agent_id)
    .bind(new.project_id)
    .fetch_one(&mut *tx)
    .await?;

    append_price_history(
        &mut tx,
        property.id,
        property.price,
        property.rent_price,
        PriceChangeType::Created,
        changed_by,
    )
    .await?;

    tx.commit().await?;

    tracing::info!(property_id = %property.id, "property created");
    Ok(property)
}

/// Apply a partial update. Ownership is enforced here: non-internal agents
/// may only touch their own rows. A price or rent change appends exactly one
/// price-history row in the same transaction; a status change goes through
/// the lifecycle rules and refreshes verification with source AGENT.
pub async fn update_property(
    pool: &PgPool,
    id: Uuid,
    patch: PropertyPatch,
    actor: &AgentProfile,
) -> Result<Property, ApiError> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Property {} not found", id)))?;

    if !actor.role.is_internal() && current.agent_id != Some(actor.id) {
        return Err(ApiError::forbidden("Property belongs to another agent"));
    }

    let next_status = patch.status.unwrap_or(current.status);
    let status_changed = next_status != current.status;
    if status_changed {
        validate_status_change(current.status, next_status)?;
    }

    let next_price = patch.price.unwrap_or(current.price);
    let next_rent = patch.rent_price.unwrap_or(current.rent_price);
    validate_price(next_price)?;
    if let Some(rent) = next_rent {
        validate_price(rent)?;
    }
    let price_changed = next_price != current.price;
    let rent_changed = next_rent != current.rent_price;

    let property = sqlx::query_as::<_, Property>(
        r#"
        UPDATE properties SET
            title = $2,
            description = $3,
            address = $4,
            city = $5,
            postal_code = $6,
            status = $7,
            listing_type = $8,
            price = $9,
            rent_price = $10,
            agent_id = $11,
            project_id = $12,
            last_verified_at = CASE WHEN $13 THEN
                GREATEST(COALESCE(last_verified_at, 'epoch'::timestamptz), NOW())
                ELSE last_verified_at END,
            verification_source = CASE WHEN $13 THEN 'AGENT'::verification_source
                ELSE verification_source END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(patch.title.as_ref().unwrap_or(&current.title))
    .bind(patch.description.as_ref().or(current.description.as_ref()))
    .bind(patch.address.as_ref().or(current.address.as_ref()))
    .bind(patch.city.as_ref().or(current.city.as_ref()))
    .bind(patch.postal_code.as_ref().or(current.postal_code.as_ref()))
    .bind(next_status)
    .bind(patch.listing_type.unwrap_or(current.listing_type))
    .bind(next_price)
    .bind(next_rent)
    .bind(patch.agent_id.or(current.agent_id))
    .bind(patch.project_id.or(current.project_id))
    .bind(status_changed)
    .fetch_one(&mut *tx)
    .await?;

    if price_changed || rent_changed {
        let change_type = if price_changed {
            PriceChangeType::PriceChange
        } else {
            PriceChangeType::RentPriceChange
        };
        append_price_history(
            &mut tx,
            property.id,
            property.price,
            property.rent_price,
            change_type,
            &actor.email,
        )
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        property_id = %property.id,
        agent_id = %actor.id,
        status_changed,
        price_changed = price_changed || rent_changed,
        "property updated"
    );
    Ok(property)
}

/// Apply a verification action to a property. Used by the public verify
/// link (source OWNER) and internal triggers (source SYSTEM).
/// `last_verified_at` only ever moves forward.
pub async fn apply_verify_action(
    pool: &PgPool,
    property_id: Uuid,
    action: VerifyAction,
    source: VerificationSource,
) -> Result<Property, ApiError> {
    let property = sqlx::query_as::<_, Property>(
        r#"
        UPDATE properties SET
            status = $2,
            last_verified_at = GREATEST(COALESCE(last_verified_at, 'epoch'::timestamptz), NOW()),
            verification_source = $3,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(property_id)
    .bind(action.status())
    .bind(source)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Property {} not found", property_id)))?;

    tracing::info!(
        property_id = %property.id,
        status = property.status.as_str(),
        "property verified"
    );
    Ok(property)
}

pub async fn price_history(
    pool: &PgPool,
    property_id: Uuid,
) -> Result<Vec<PriceHistory>, ApiError> {
    // Ensure the property exists so missing ids give a 404, not an empty list
    get_property(pool, property_id).await?;

    let rows = sqlx::query_as::<_, PriceHistory>(
        "SELECT * FROM price_history WHERE property_id = $1 ORDER BY created_at DESC",
    )
    .bind(property_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn append_price_history(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    property_id: Uuid,
    price: Decimal,
    rent_price: Option<Decimal>,
    change_type: PriceChangeType,
    changed_by: &str,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        INSERT INTO price_history
            (id, property_id, price, rent_price, change_type, changed_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(property_id)
    .bind(price)
    .bind(rent_price)
    .bind(change_type)
    .bind(changed_by)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), ApiError> {
    if price < Decimal::ZERO {
        return Err(ApiError::validation("price must not be negative"));
    }
    Ok(())
}
