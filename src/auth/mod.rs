use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::database::models::AgentRole;

/// Claims carried in the identity provider's session JWT. The provider
/// signs with a shared HS256 secret; we only ever validate, never mint,
/// in production paths.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    pub fn new(sub: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            sub: sub.into(),
            email: email.into(),
            exp: (now + Duration::hours(24)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Identity resolved from a valid session token. May or may not map to an
/// AgentProfile row - handlers must not assume an agent record exists.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}

pub fn verify_session_token(token: &str, secret: &str) -> Result<SessionUser, String> {
    if secret.is_empty() {
        return Err("Session secret not configured".to_string());
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<SessionClaims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Invalid session token: {}", e))?;

    Ok(SessionUser {
        id: token_data.claims.sub,
        email: token_data.claims.email,
    })
}

/// Mint a session token the way the identity provider would. Used by tests
/// and local tooling; production tokens come from the provider.
pub fn issue_session_token(claims: &SessionClaims, secret: &str) -> Result<String, String> {
    if secret.is_empty() {
        return Err("Session secret not configured".to_string());
    }
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| format!("Token generation error: {}", e))
}

/// Typed authorization decision, evaluated once per request instead of
/// inline role conditionals scattered through handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny(&'static str),
}

impl Access {
    pub fn is_allowed(self) -> bool {
        matches!(self, Access::Allow)
    }
}

pub fn check_roles(role: AgentRole, allowed: &[AgentRole]) -> Access {
    if allowed.is_empty() || allowed.contains(&role) {
        Access::Allow
    } else {
        Access::Deny("Role not permitted for this operation")
    }
}
