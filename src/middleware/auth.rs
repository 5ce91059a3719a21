use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{self, Access, SessionUser};
use crate::database::models::{AgentProfile, AgentRole};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated request context. A valid session does not guarantee an
/// agent record: a user can authenticate with the identity provider before
/// anyone has provisioned an AgentProfile for them. Handlers must go through
/// `require_agent`/`require_role` instead of assuming `agent` is present.
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub user: SessionUser,
    pub agent: Option<AgentProfile>,
}

impl AuthSession {
    /// Fail explicitly when the session has no active agent record
    pub fn require_agent(&self) -> Result<&AgentProfile, ApiError> {
        let agent = self.agent.as_ref().ok_or_else(|| {
            ApiError::forbidden("No agent profile is linked to this account")
        })?;
        if !agent.is_active {
            return Err(ApiError::forbidden("Agent profile is deactivated"));
        }
        Ok(agent)
    }

    /// Require an active agent whose role is in the allowed set
    pub fn require_role(&self, allowed: &[AgentRole]) -> Result<&AgentProfile, ApiError> {
        let agent = self.require_agent()?;
        match auth::check_roles(agent.role, allowed) {
            Access::Allow => Ok(agent),
            Access::Deny(reason) => Err(ApiError::forbidden(reason)),
        }
    }
}

/// Session authentication middleware for `/api/*` routes.
///
/// Validates the bearer session token, resolves the agent profile by the
/// session email, and injects the combined context into request extensions.
/// Missing or invalid tokens fail with 401 before the handler runs.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;

    let user = auth::verify_session_token(&token, &state.session_secret)
        .map_err(ApiError::unauthorized)?;

    let agent = sqlx::query_as::<_, AgentProfile>(
        r#"
        SELECT id, email, name, phone, role, is_active, created_at
        FROM agent_profiles
        WHERE email = $1
        "#,
    )
    .bind(&user.email)
    .fetch_optional(&state.pool)
    .await?;

    if agent.is_none() {
        tracing::debug!(user_id = %user.id, "session has no matching agent profile");
    }

    request.extensions_mut().insert(AuthSession { user, agent });
    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty session token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
