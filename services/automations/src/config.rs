/// Automations service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AutomationsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3114). Env var: `AUTOMATIONS_PORT`.
    pub automations_port: u16,
    /// Shared secret the scheduler must present on `/automations/run`.
    /// Optional at startup; an unset secret makes the trigger answer 500.
    pub cron_secret: Option<String>,
    /// Base URL of the token service that holds per-tenant mail credentials.
    pub mail_token_url: String,
    /// Base URL of the mail gateway (default `https://gmail.googleapis.com`).
    pub mail_api_url: String,
    /// How many tenant pipelines run at once (default 4).
    pub tenant_concurrency: usize,
    /// How many mail sends run at once within one tenant (default 3).
    pub send_concurrency: usize,
    /// Per-send timeout in seconds (default 20). A timeout is logged as a
    /// send error for that target only.
    pub send_timeout_secs: u64,
    /// Timeout for outbound HTTP calls and the DB connect (default 10).
    pub http_timeout_secs: u64,
}

impl AutomationsConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            automations_port: std::env::var("AUTOMATIONS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3114),
            cron_secret: std::env::var("CRON_SECRET").ok().filter(|v| !v.is_empty()),
            mail_token_url: std::env::var("MAIL_TOKEN_URL").expect("MAIL_TOKEN_URL"),
            mail_api_url: std::env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://gmail.googleapis.com".to_owned()),
            tenant_concurrency: std::env::var("TENANT_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            send_concurrency: std::env::var("SEND_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            send_timeout_secs: std::env::var("SEND_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}
