use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use corredor_core::health::health_routes;

use crate::handlers::run::run_automations;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        // Scheduler trigger. Both verbs are accepted; some cron providers can
        // only issue GETs.
        .route(
            "/automations/run",
            get(run_automations).post(run_automations),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
