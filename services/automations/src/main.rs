use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database};
use tracing::info;

use corredor_automations::config::AutomationsConfig;
use corredor_automations::router::build_router;
use corredor_automations::state::AppState;

#[tokio::main]
async fn main() {
    corredor_core::tracing::init_tracing("automations");

    let config = AutomationsConfig::from_env();

    let mut db_options = ConnectOptions::new(config.database_url.clone());
    db_options
        .connect_timeout(Duration::from_secs(config.http_timeout_secs))
        .sqlx_logging(false);
    let db = Database::connect(db_options)
        .await
        .expect("failed to connect to database");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .expect("failed to build HTTP client");

    let addr = format!("0.0.0.0:{}", config.automations_port);
    let state = AppState {
        db,
        http,
        config: Arc::new(config),
    };

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("automations service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
