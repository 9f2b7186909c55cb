use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use chrono::NaiveDate;
use uuid::Uuid;

use corredor_automations::domain::repository::{
    EntityRepository, MailAccessProvider, MailGateway, OutcomeLedger, RecordedKey, RuleRepository,
    TemplateRepository,
};
use corredor_automations::domain::types::{
    AutomationRule, Customer, Lead, MailAccess, MessageTemplate, OutboundEmail, OutcomeEntry,
    Policy, RuleConfig, RuleKey,
};
use corredor_automations::error::AutomationServiceError;
use corredor_automations::usecase::run::RunAutomationsUseCase;

// ── MockRuleRepo ─────────────────────────────────────────────────────────────

pub struct MockRuleRepo {
    pub by_tenant: HashMap<Uuid, Vec<AutomationRule>>,
}

impl MockRuleRepo {
    pub fn single_tenant(tenant_id: Uuid, rules: Vec<AutomationRule>) -> Self {
        Self {
            by_tenant: HashMap::from([(tenant_id, rules)]),
        }
    }
}

impl RuleRepository for MockRuleRepo {
    async fn load_enabled(
        &self,
    ) -> Result<HashMap<Uuid, Vec<AutomationRule>>, AutomationServiceError> {
        Ok(self.by_tenant.clone())
    }
}

pub struct FailingRuleRepo;

impl RuleRepository for FailingRuleRepo {
    async fn load_enabled(
        &self,
    ) -> Result<HashMap<Uuid, Vec<AutomationRule>>, AutomationServiceError> {
        Err(anyhow!("connection refused").into())
    }
}

// ── MockEntityRepo ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockEntityRepo {
    pub leads: HashMap<Uuid, Vec<Lead>>,
    pub customers: HashMap<Uuid, Vec<Customer>>,
    pub policies: HashMap<Uuid, Vec<Policy>>,
    pub failing_tenants: HashSet<Uuid>,
    /// `(collection, tenant_id)` log of every fetch issued.
    pub calls: Arc<Mutex<Vec<(&'static str, Uuid)>>>,
}

impl MockEntityRepo {
    pub fn calls_handle(&self) -> Arc<Mutex<Vec<(&'static str, Uuid)>>> {
        Arc::clone(&self.calls)
    }

    fn check(&self, tenant_id: Uuid) -> Result<(), AutomationServiceError> {
        if self.failing_tenants.contains(&tenant_id) {
            Err(anyhow!("tenant records unavailable").into())
        } else {
            Ok(())
        }
    }
}

impl EntityRepository for MockEntityRepo {
    async fn list_leads(&self, tenant_id: Uuid) -> Result<Vec<Lead>, AutomationServiceError> {
        self.calls.lock().unwrap().push(("leads", tenant_id));
        self.check(tenant_id)?;
        Ok(self.leads.get(&tenant_id).cloned().unwrap_or_default())
    }

    async fn list_customers(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<Customer>, AutomationServiceError> {
        self.calls.lock().unwrap().push(("customers", tenant_id));
        self.check(tenant_id)?;
        Ok(self.customers.get(&tenant_id).cloned().unwrap_or_default())
    }

    async fn list_policies(&self, tenant_id: Uuid) -> Result<Vec<Policy>, AutomationServiceError> {
        self.calls.lock().unwrap().push(("policies", tenant_id));
        self.check(tenant_id)?;
        Ok(self.policies.get(&tenant_id).cloned().unwrap_or_default())
    }
}

// ── MockTemplateRepo ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockTemplateRepo {
    pub templates: Vec<MessageTemplate>,
}

impl TemplateRepository for MockTemplateRepo {
    async fn list_by_ids(
        &self,
        _tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<MessageTemplate>, AutomationServiceError> {
        Ok(self
            .templates
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }
}

// ── MockLedger ───────────────────────────────────────────────────────────────

/// In-memory ledger enforcing the natural-key uniqueness the real table gets
/// from its unique index.
#[derive(Default)]
pub struct MockLedger {
    pub entries: Arc<Mutex<Vec<OutcomeEntry>>>,
}

impl MockLedger {
    pub fn entries_handle(&self) -> Arc<Mutex<Vec<OutcomeEntry>>> {
        Arc::clone(&self.entries)
    }

    /// A second ledger view over the same storage, for re-run tests.
    pub fn sharing(entries: Arc<Mutex<Vec<OutcomeEntry>>>) -> Self {
        Self { entries }
    }
}

impl OutcomeLedger for MockLedger {
    async fn list_recorded(
        &self,
        tenant_id: Uuid,
        run_date: NaiveDate,
    ) -> Result<HashSet<RecordedKey>, AutomationServiceError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.key.tenant_id == tenant_id && e.key.run_date == run_date)
            .map(|e| {
                (
                    e.key.rule_key.as_str().to_owned(),
                    e.key.target_table.as_str().to_owned(),
                    e.key.target_id,
                )
            })
            .collect())
    }

    async fn record_once(&self, entry: &OutcomeEntry) -> Result<bool, AutomationServiceError> {
        let mut entries = self.entries.lock().unwrap();
        let exists = entries.iter().any(|e| e.key == entry.key);
        if exists {
            return Ok(false);
        }
        entries.push(entry.clone());
        Ok(true)
    }
}

// ── MockMailAccess / MockGateway ─────────────────────────────────────────────

pub struct MockMailAccess {
    pub token: Option<MailAccess>,
    pub requests: Arc<Mutex<Vec<Uuid>>>,
}

impl MockMailAccess {
    pub fn connected() -> Self {
        Self {
            token: Some(MailAccess {
                access_token: "ya29.test-token".to_owned(),
                sender: Some("agente@example.com".to_owned()),
            }),
            requests: Arc::default(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            token: None,
            requests: Arc::default(),
        }
    }

    pub fn requests_handle(&self) -> Arc<Mutex<Vec<Uuid>>> {
        Arc::clone(&self.requests)
    }
}

impl MailAccessProvider for MockMailAccess {
    async fn access_for(&self, tenant_id: Uuid) -> Result<MailAccess, AutomationServiceError> {
        self.requests.lock().unwrap().push(tenant_id);
        self.token
            .clone()
            .ok_or_else(|| anyhow!("no mail account linked").into())
    }
}

#[derive(Default)]
pub struct MockGateway {
    pub sent: Arc<Mutex<Vec<OutboundEmail>>>,
    /// Addresses for which the gateway throws.
    pub fail_to: HashSet<String>,
}

impl MockGateway {
    pub fn sent_handle(&self) -> Arc<Mutex<Vec<OutboundEmail>>> {
        Arc::clone(&self.sent)
    }

    pub fn failing_for(address: &str) -> Self {
        Self {
            sent: Arc::default(),
            fail_to: HashSet::from([address.to_owned()]),
        }
    }
}

impl MailGateway for MockGateway {
    async fn send(
        &self,
        _access: &MailAccess,
        mail: &OutboundEmail,
    ) -> Result<(), AutomationServiceError> {
        if self.fail_to.contains(&mail.to) {
            return Err(anyhow!("mail gateway rejected send: 500 backend unavailable").into());
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub type TestUseCase = RunAutomationsUseCase<
    MockRuleRepo,
    MockEntityRepo,
    MockTemplateRepo,
    MockLedger,
    MockMailAccess,
    MockGateway,
>;

pub fn usecase(
    rules: MockRuleRepo,
    entities: MockEntityRepo,
    templates: MockTemplateRepo,
    ledger: MockLedger,
    mail_access: MockMailAccess,
    gateway: MockGateway,
) -> TestUseCase {
    RunAutomationsUseCase {
        rules,
        entities,
        templates,
        ledger,
        mail_access,
        gateway,
        tenant_concurrency: 4,
        send_concurrency: 3,
        send_timeout: Duration::from_secs(5),
    }
}

pub fn rule(tenant_id: Uuid, key: RuleKey, config: RuleConfig) -> AutomationRule {
    AutomationRule {
        tenant_id,
        key,
        config,
    }
}

pub fn lead(name: &str, email: Option<&str>, birth_date: Option<&str>) -> Lead {
    Lead {
        id: Uuid::new_v4(),
        name: Some(name.to_owned()),
        first_name: None,
        last_name: None,
        email: email.map(str::to_owned),
        birth_date: birth_date.map(str::to_owned),
    }
}

pub fn customer(name: &str, email: Option<&str>, birth_date: Option<&str>) -> Customer {
    Customer {
        id: Uuid::new_v4(),
        name: Some(name.to_owned()),
        first_name: None,
        last_name: None,
        email: email.map(str::to_owned),
        birth_date: birth_date.map(str::to_owned),
    }
}

pub fn policy(number: &str, customer_id: Option<Uuid>, expiry_date: Option<&str>) -> Policy {
    Policy {
        id: Uuid::new_v4(),
        policy_number: number.to_owned(),
        customer_id,
        expiry_date: expiry_date.map(str::to_owned),
    }
}

pub fn tz_config(timezone: &str) -> RuleConfig {
    serde_json::from_value(serde_json::json!({ "timezone": timezone })).unwrap()
}
