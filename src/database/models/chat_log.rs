use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Chat interaction logged by external automation. Fire-and-forget:
/// the gateway acknowledges before caring whether the insert stuck.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatLog {
    pub id: Uuid,
    pub session_id: String,
    pub channel: Option<String>,
    pub user_message: Option<String>,
    pub bot_reply: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}
