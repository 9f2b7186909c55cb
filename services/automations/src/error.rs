use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Automations service error variants.
///
/// Only run-fatal conditions live here. Per-target skip/error outcomes are not
/// errors — they end up as ledger rows, never as responses.
#[derive(Debug, thiserror::Error)]
pub enum AutomationServiceError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("CRON_SECRET is not configured")]
    SchedulerSecretMissing,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AutomationServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::SchedulerSecretMissing => "NOT_CONFIGURED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Human-readable detail, including the context chain for internals.
    /// Used for ledger messages and the trigger's failure body.
    pub fn detail(&self) -> String {
        match self {
            Self::Internal(e) => format!("{e:#}"),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AutomationServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::SchedulerSecretMissing | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        // The scheduler is the only caller; it knows exactly one failure shape.
        let body = serde_json::json!({
            "ok": false,
            "error": self.detail(),
        });
        (status, axum::Json(body)).into_response()
    }
}
