#![allow(async_fn_in_trait)]

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::types::{
    AutomationRule, Customer, Lead, MailAccess, MessageTemplate, OutboundEmail, OutcomeEntry,
    Policy,
};
use crate::error::AutomationServiceError;

/// `(rule_key, target_table, target_id)` as stored in the ledger, scoped to a
/// tenant and run date by the query that produced it.
pub type RecordedKey = (String, String, Uuid);

/// Rule store: the engine's only view of tenant configuration.
pub trait RuleRepository: Send + Sync {
    /// All enabled rules, grouped by tenant. A failure here is fatal to the
    /// whole run — there is nothing to process without rules.
    async fn load_enabled(
        &self,
    ) -> Result<HashMap<Uuid, Vec<AutomationRule>>, AutomationServiceError>;
}

/// Read-only access to the tenant's candidate records.
pub trait EntityRepository: Send + Sync {
    async fn list_leads(&self, tenant_id: Uuid) -> Result<Vec<Lead>, AutomationServiceError>;
    async fn list_customers(&self, tenant_id: Uuid)
    -> Result<Vec<Customer>, AutomationServiceError>;
    async fn list_policies(&self, tenant_id: Uuid) -> Result<Vec<Policy>, AutomationServiceError>;
}

/// Tenant-scoped message templates.
pub trait TemplateRepository: Send + Sync {
    /// Templates for the given ids that belong to the tenant. Missing ids are
    /// simply absent from the result; the caller falls back to defaults.
    async fn list_by_ids(
        &self,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<MessageTemplate>, AutomationServiceError>;
}

/// Append-only outcome ledger with a natural-key uniqueness guarantee.
pub trait OutcomeLedger: Send + Sync {
    /// Natural-key triples already recorded for the tenant on `run_date`.
    async fn list_recorded(
        &self,
        tenant_id: Uuid,
        run_date: NaiveDate,
    ) -> Result<HashSet<RecordedKey>, AutomationServiceError>;

    /// Insert-or-ignore on the natural key. `Ok(false)` means a row with the
    /// same key already existed; callers treat both results as success.
    async fn record_once(&self, entry: &OutcomeEntry) -> Result<bool, AutomationServiceError>;
}

/// Token provider for the tenant's mail account. Failure is a normal,
/// non-fatal condition — the tenant proceeds without a credential and its
/// email targets are skipped.
pub trait MailAccessProvider: Send + Sync {
    async fn access_for(&self, tenant_id: Uuid) -> Result<MailAccess, AutomationServiceError>;
}

/// The external mail gateway, reduced to the one call this engine makes.
pub trait MailGateway: Send + Sync {
    async fn send(
        &self,
        access: &MailAccess,
        mail: &OutboundEmail,
    ) -> Result<(), AutomationServiceError>;
}
