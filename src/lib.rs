pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ratelimit;
pub mod services;
pub mod state;

use axum::{
    extract::State,
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Assemble the full router. Shared with the integration tests so they can
/// drive the exact production middleware stack in-process.
pub fn app(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/properties", get(handlers::properties::public_list))
        .route("/properties/:id", get(handlers::properties::public_get))
        .route("/enquiries", post(handlers::enquiries::create))
        .route("/submissions", post(handlers::submissions::create))
        .route("/verify/:property_id", post(handlers::verify::submit));

    // Session-authenticated agent API. Layer order matters: session auth is
    // the outer layer so the rate limiter can key on the resolved agent.
    let agent_api = Router::new()
        .route("/api/auth/whoami", get(handlers::whoami::whoami))
        .route(
            "/api/properties",
            get(handlers::properties::list).post(handlers::properties::create),
        )
        .route("/api/properties/:id", patch(handlers::properties::update))
        .route(
            "/api/properties/:id/price-history",
            get(handlers::properties::price_history),
        )
        .route("/api/enquiries", get(handlers::enquiries::list))
        .route("/api/enquiries/:id", patch(handlers::enquiries::update))
        .route(
            "/api/deals",
            get(handlers::deals::list).post(handlers::deals::create),
        )
        .route("/api/deals/:id", patch(handlers::deals::update))
        .route("/api/submissions", get(handlers::submissions::list))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::agent_rate_limit_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_auth_middleware,
        ));

    // Automation ingress: API-key gate runs before rate limiting and logic
    let automation = Router::new()
        .route("/api/n8n/chat-logs", post(handlers::automation::chat::create))
        .route(
            "/api/n8n/deals/:id/documents",
            post(handlers::automation::documents::attach),
        )
        .route("/api/n8n/posts", post(handlers::automation::posts::create))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::automation_auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(agent_api)
        .merge(automation)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Estate API (Rust)",
            "version": version,
            "description": "Real-estate listing platform API built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "listings": "/properties[/:id] (public)",
                "enquiries": "/enquiries (public - lead capture)",
                "submissions": "/submissions (public - property intake)",
                "verify": "/verify/:property_id (public - owner confirmation links)",
                "agent": "/api/* (session-authenticated agent dashboard)",
                "automation": "/api/n8n/* (restricted, requires X-N8N-API-Key)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                axum::response::Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unreachable"
                    }
                })),
            )
        }
    }
}
