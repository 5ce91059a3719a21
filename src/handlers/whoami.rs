use axum::Extension;
use serde_json::{json, Value};

use crate::api::response::{ApiResponse, ApiResult};
use crate::middleware::AuthSession;

/// GET /api/auth/whoami - echo the resolved session and agent context.
/// Useful for dashboards to discover role and for debugging token issues.
pub async fn whoami(Extension(session): Extension<AuthSession>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "user": {
            "id": session.user.id,
            "email": session.user.email,
        },
        "agent": session.agent,
    })))
}
