use std::sync::Arc;

use sqlx::PgPool;

use crate::config;
use crate::ratelimit::{RateLimitPolicy, RateLimiter};
use crate::services::geocode::{self, Geocoder};

/// Shared per-process state handed to every handler and middleware layer.
///
/// The rate limiter and geocoder live here (not in module singletons) so
/// tests can inject their own and reset them deterministically.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub limiter: Arc<RateLimiter>,
    pub geocoder: Arc<dyn Geocoder>,
    pub session_secret: String,
    pub automation_key: String,
    pub agent_policy: RateLimitPolicy,
    pub automation_policy: RateLimitPolicy,
}

impl AppState {
    pub fn from_config(pool: PgPool) -> Self {
        let cfg = config::config();
        Self {
            pool,
            limiter: Arc::new(RateLimiter::new()),
            geocoder: geocode::from_config(&cfg.geocoding),
            session_secret: cfg.security.session_jwt_secret.clone(),
            automation_key: cfg.security.automation_api_key.clone(),
            agent_policy: RateLimitPolicy::agent(&cfg.rate_limits),
            automation_policy: RateLimitPolicy::automation(&cfg.rate_limits),
        }
    }
}
