use estate_api_rust::{app, config, database, state::AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, secrets, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Estate API in {:?} mode", config.environment);

    let pool = database::connect_pool().expect("failed to create database pool");
    let state = AppState::from_config(pool);
    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("ESTATE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Estate API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
