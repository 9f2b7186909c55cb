use std::time::Duration;

use axum::{Json, extract::State, http::HeaderMap, http::header::AUTHORIZATION};
use chrono::Utc;
use serde::Serialize;

use crate::error::AutomationServiceError;
use crate::state::AppState;
use crate::usecase::run::RunAutomationsUseCase;

const X_CRON_SECRET: &str = "x-cron-secret";

// ── Response type ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RunResponse {
    pub ok: bool,
    /// Tenants with at least one enabled rule.
    pub users: u64,
    /// Ledger writes performed during this run.
    pub processed: u64,
}

/// Compare the scheduler-supplied secret (custom header or bearer token)
/// against the configured one.
pub fn authorize(
    headers: &HeaderMap,
    configured: Option<&str>,
) -> Result<(), AutomationServiceError> {
    let secret = configured.ok_or(AutomationServiceError::SchedulerSecretMissing)?;

    let from_header = headers.get(X_CRON_SECRET).and_then(|v| v.to_str().ok());
    let from_bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if from_header == Some(secret) || from_bearer == Some(secret) {
        Ok(())
    } else {
        Err(AutomationServiceError::Unauthorized)
    }
}

// ── GET/POST /automations/run ────────────────────────────────────────────────

pub async fn run_automations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RunResponse>, AutomationServiceError> {
    authorize(&headers, state.config.cron_secret.as_deref())?;

    let usecase = RunAutomationsUseCase {
        rules: state.rule_repo(),
        entities: state.entity_repo(),
        templates: state.template_repo(),
        ledger: state.outcome_ledger(),
        mail_access: state.mail_access_provider(),
        gateway: state.mail_gateway(),
        tenant_concurrency: state.config.tenant_concurrency,
        send_concurrency: state.config.send_concurrency,
        send_timeout: Duration::from_secs(state.config.send_timeout_secs),
    };

    let summary = usecase.execute(Utc::now()).await?;
    Ok(Json(RunResponse {
        ok: true,
        users: summary.users,
        processed: summary.processed,
    }))
}
