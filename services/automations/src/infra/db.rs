use std::collections::{HashMap, HashSet};

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    sea_query::OnConflict,
};
use tracing::warn;
use uuid::Uuid;

use corredor_automations_schema::{
    automation_log, automation_rules, customers, leads, message_templates, policies,
};

use crate::domain::repository::{
    EntityRepository, OutcomeLedger, RecordedKey, RuleRepository, TemplateRepository,
};
use crate::domain::types::{
    AutomationRule, Customer, Lead, MessageTemplate, OutcomeEntry, Policy, RuleConfig, RuleKey,
};
use crate::error::AutomationServiceError;

// ── Rule store ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRuleRepository {
    pub db: DatabaseConnection,
}

impl RuleRepository for DbRuleRepository {
    async fn load_enabled(
        &self,
    ) -> Result<HashMap<Uuid, Vec<AutomationRule>>, AutomationServiceError> {
        let models = automation_rules::Entity::find()
            .filter(automation_rules::Column::Enabled.eq(true))
            .all(&self.db)
            .await
            .context("load enabled automation rules")?;

        let mut by_tenant: HashMap<Uuid, Vec<AutomationRule>> = HashMap::new();
        for model in models {
            // rule_key is a closed set; rows written by an unknown newer (or
            // retired) key are skipped rather than guessed at.
            let Some(key) = RuleKey::parse(&model.rule_key) else {
                warn!(
                    tenant_id = %model.tenant_id,
                    rule_key = %model.rule_key,
                    "unknown rule key, skipping"
                );
                continue;
            };
            let config = model
                .config
                .map(|raw| match serde_json::from_value::<RuleConfig>(raw) {
                    Ok(config) => config,
                    Err(e) => {
                        warn!(
                            tenant_id = %model.tenant_id,
                            rule_key = %model.rule_key,
                            error = %e,
                            "unparsable rule config, using defaults"
                        );
                        RuleConfig::default()
                    }
                })
                .unwrap_or_default();
            by_tenant
                .entry(model.tenant_id)
                .or_default()
                .push(AutomationRule {
                    tenant_id: model.tenant_id,
                    key,
                    config,
                });
        }
        Ok(by_tenant)
    }
}

// ── Entity fetcher ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbEntityRepository {
    pub db: DatabaseConnection,
}

impl EntityRepository for DbEntityRepository {
    async fn list_leads(&self, tenant_id: Uuid) -> Result<Vec<Lead>, AutomationServiceError> {
        let models = leads::Entity::find()
            .filter(leads::Column::TenantId.eq(tenant_id))
            .all(&self.db)
            .await
            .context("list leads")?;
        Ok(models
            .into_iter()
            .map(|m| Lead {
                id: m.id,
                name: m.name,
                first_name: m.first_name,
                last_name: m.last_name,
                email: m.email,
                birth_date: m.birth_date,
            })
            .collect())
    }

    async fn list_customers(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<Customer>, AutomationServiceError> {
        let models = customers::Entity::find()
            .filter(customers::Column::TenantId.eq(tenant_id))
            .all(&self.db)
            .await
            .context("list customers")?;
        Ok(models
            .into_iter()
            .map(|m| Customer {
                id: m.id,
                name: m.name,
                first_name: m.first_name,
                last_name: m.last_name,
                email: m.email,
                birth_date: m.birth_date,
            })
            .collect())
    }

    async fn list_policies(&self, tenant_id: Uuid) -> Result<Vec<Policy>, AutomationServiceError> {
        let models = policies::Entity::find()
            .filter(policies::Column::TenantId.eq(tenant_id))
            .all(&self.db)
            .await
            .context("list policies")?;
        Ok(models
            .into_iter()
            .map(|m| Policy {
                id: m.id,
                policy_number: m.policy_number,
                customer_id: m.customer_id,
                expiry_date: m.expiry_date,
            })
            .collect())
    }
}

// ── Template store ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTemplateRepository {
    pub db: DatabaseConnection,
}

impl TemplateRepository for DbTemplateRepository {
    async fn list_by_ids(
        &self,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<MessageTemplate>, AutomationServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = message_templates::Entity::find()
            .filter(message_templates::Column::TenantId.eq(tenant_id))
            .filter(message_templates::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .context("list message templates")?;
        Ok(models
            .into_iter()
            .map(|m| MessageTemplate {
                id: m.id,
                subject: m.subject,
                text: m.text,
                html: m.html,
            })
            .collect())
    }
}

// ── Outcome ledger ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOutcomeLedger {
    pub db: DatabaseConnection,
}

impl OutcomeLedger for DbOutcomeLedger {
    async fn list_recorded(
        &self,
        tenant_id: Uuid,
        run_date: NaiveDate,
    ) -> Result<HashSet<RecordedKey>, AutomationServiceError> {
        let rows = automation_log::Entity::find()
            .filter(automation_log::Column::TenantId.eq(tenant_id))
            .filter(automation_log::Column::RunDate.eq(run_date))
            .all(&self.db)
            .await
            .context("list recorded outcomes")?;
        Ok(rows
            .into_iter()
            .map(|row| (row.rule_key, row.target_table, row.target_id))
            .collect())
    }

    async fn record_once(&self, entry: &OutcomeEntry) -> Result<bool, AutomationServiceError> {
        let model = automation_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(entry.key.tenant_id),
            rule_key: Set(entry.key.rule_key.as_str().to_owned()),
            target_table: Set(entry.key.target_table.as_str().to_owned()),
            target_id: Set(entry.key.target_id),
            run_date: Set(entry.key.run_date),
            status: Set(entry.status.as_str().to_owned()),
            message: Set(entry.message.clone()),
            metadata: Set(entry.metadata.clone()),
            created_at: Set(Utc::now()),
        };

        let inserted = automation_log::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    automation_log::Column::TenantId,
                    automation_log::Column::RuleKey,
                    automation_log::Column::TargetTable,
                    automation_log::Column::TargetId,
                    automation_log::Column::RunDate,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;

        match inserted {
            Ok(rows) => Ok(rows > 0),
            // Another invocation got its row in first; that row stands.
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(anyhow::Error::new(e).context("record outcome").into()),
        }
    }
}
