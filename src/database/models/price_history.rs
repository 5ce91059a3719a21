use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "price_change_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceChangeType {
    Created,
    PriceChange,
    RentPriceChange,
}

/// Append-only audit record: one row per price-affecting mutation, written
/// in the same transaction as the property change. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistory {
    pub id: Uuid,
    pub property_id: Uuid,
    pub price: Decimal,
    pub rent_price: Option<Decimal>,
    pub change_type: PriceChangeType,
    pub changed_by: String,
    pub created_at: DateTime<Utc>,
}
