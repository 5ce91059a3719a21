use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Pipeline record for a property. `stage` is a free-form pipeline stage;
/// a stage change also refreshes the owning property's verification in the
/// same transaction. `metadata` is a keyed union of sub-documents (invoice,
/// receipt, ...) merged key-wise, never overwritten wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: Uuid,
    pub property_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub stage: String,
    pub amount: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub lease_start: Option<NaiveDate>,
    pub lease_end: Option<NaiveDate>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
