use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AutomationsConfig;
use crate::infra::db::{DbEntityRepository, DbOutcomeLedger, DbRuleRepository, DbTemplateRepository};
use crate::infra::mail::{HttpMailAccessProvider, HttpMailGateway};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub http: reqwest::Client,
    pub config: Arc<AutomationsConfig>,
}

impl AppState {
    pub fn rule_repo(&self) -> DbRuleRepository {
        DbRuleRepository {
            db: self.db.clone(),
        }
    }

    pub fn entity_repo(&self) -> DbEntityRepository {
        DbEntityRepository {
            db: self.db.clone(),
        }
    }

    pub fn template_repo(&self) -> DbTemplateRepository {
        DbTemplateRepository {
            db: self.db.clone(),
        }
    }

    pub fn outcome_ledger(&self) -> DbOutcomeLedger {
        DbOutcomeLedger {
            db: self.db.clone(),
        }
    }

    pub fn mail_access_provider(&self) -> HttpMailAccessProvider {
        HttpMailAccessProvider {
            http: self.http.clone(),
            token_url: self.config.mail_token_url.clone(),
        }
    }

    pub fn mail_gateway(&self) -> HttpMailGateway {
        HttpMailGateway {
            http: self.http.clone(),
            api_url: self.config.mail_api_url.clone(),
        }
    }
}
