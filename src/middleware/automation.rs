use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-n8n-api-key";

/// Identifier length used for rate limiting and logs. Never the full key:
/// the secret must not end up in limiter state or log lines.
const KEY_PREFIX_LEN: usize = 8;

/// API-key gate for the `/api/n8n/*` automation ingress.
///
/// Key equality is checked before rate limiting or any business logic; the
/// failure body is the flat `{"error": ...}` shape the automation tooling
/// expects, not the session API envelope.
pub async fn automation_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    if state.automation_key.is_empty() {
        tracing::error!("automation API key is not configured");
        return Err(reject(StatusCode::UNAUTHORIZED, "Automation access is not configured"));
    }

    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if presented.is_empty() || presented != state.automation_key {
        tracing::warn!("automation request rejected: missing or invalid API key");
        return Err(reject(StatusCode::UNAUTHORIZED, "Invalid API key"));
    }

    let identifier = format!("n8n:{}", key_prefix(presented));
    let decision = state.limiter.check(&identifier, &state.automation_policy);
    if !decision.allowed {
        tracing::warn!(identifier = %identifier, "automation rate limit exceeded");
        return Err(
            ApiError::rate_limited("Too many requests", decision.reset_at).into_response(),
        );
    }

    Ok(next.run(request).await)
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn key_prefix(key: &str) -> &str {
    let end = key
        .char_indices()
        .nth(KEY_PREFIX_LEN)
        .map(|(i, _)| i)
        .unwrap_or(key.len());
    &key[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_prefix_truncates() {
        assert_eq!(key_prefix("abcdefghijklmnop"), "abcdefgh");
        assert_eq!(key_prefix("short"), "short");
    }
}
