use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLogRequest {
    pub session_id: String,
    pub channel: Option<String>,
    pub user_message: Option<String>,
    pub bot_reply: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// POST /api/n8n/chat-logs - fire-and-forget chat interaction log.
///
/// Always acknowledges with 201 and the generated id: the automation
/// workflow must not retry or stall on our storage hiccups, so insert
/// failures are logged and swallowed.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ChatLogRequest>,
) -> ApiResult<Value> {
    let id = Uuid::new_v4();
    let metadata = body.metadata.unwrap_or_else(|| json!({}));

    let result = sqlx::query(
        r#"
        INSERT INTO chat_logs
            (id, session_id, channel, user_message, bot_reply, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        "#,
    )
    .bind(id)
    .bind(&body.session_id)
    .bind(&body.channel)
    .bind(&body.user_message)
    .bind(&body.bot_reply)
    .bind(&metadata)
    .execute(&state.pool)
    .await;

    if let Err(e) = result {
        tracing::error!(chat_log_id = %id, "failed to persist chat log: {}", e);
    }

    Ok(ApiResponse::created(json!({ "id": id })))
}
