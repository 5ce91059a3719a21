use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::middleware::auth::AuthSession;
use crate::state::AppState;

/// Throttle authenticated traffic under the agent policy.
///
/// Runs after session auth; the counter is keyed by the agent id when an
/// agent record exists, falling back to the provider user id so sessions
/// without a profile cannot dodge the limiter.
pub async fn agent_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = request
        .extensions()
        .get::<AuthSession>()
        .ok_or_else(|| ApiError::internal("rate limiter ran before session auth"))?;

    let identifier = match &session.agent {
        Some(agent) => format!("agent:{}", agent.id),
        None => format!("user:{}", session.user.id),
    };

    let decision = state.limiter.check(&identifier, &state.agent_policy);
    if !decision.allowed {
        tracing::warn!(identifier = %identifier, "agent rate limit exceeded");
        return Err(ApiError::rate_limited("Too many requests", decision.reset_at));
    }

    Ok(next.run(request).await)
}
