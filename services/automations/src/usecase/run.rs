//! The batch orchestrator: one invocation scans every tenant with at least one
//! enabled rule, evaluates date conditions in the tenant's own timezone, and
//! funnels every matched target into exactly one ledger write.
//!
//! Isolation rules, in order of blast radius:
//! - a rule-store failure aborts the run;
//! - a tenant whose records cannot be fetched is skipped, siblings continue;
//! - a target that fails to send is recorded as `error`, siblings continue.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use futures::StreamExt as _;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::calendar;
use crate::domain::repository::{
    EntityRepository, MailAccessProvider, MailGateway, OutcomeLedger, RecordedKey, RuleRepository,
    TemplateRepository,
};
use crate::domain::template;
use crate::domain::types::{
    AutomationRule, Customer, MailAccess, MessageTemplate, OutboundEmail, OutcomeEntry, OutcomeKey,
    OutcomeStatus, RuleChannel, RuleFamily, RuleKey, RunSummary, TargetTable,
};
use crate::error::AutomationServiceError;

/// Upper bound on gateway error text captured into a ledger row.
const ERROR_MESSAGE_MAX: usize = 500;

/// One matched (rule, record) pair, owned and ready for dispatch.
#[derive(Debug, Clone)]
struct TargetEvent {
    rule_key: RuleKey,
    template_id: Option<Uuid>,
    target_table: TargetTable,
    target_id: Uuid,
    display_name: String,
    email: Option<String>,
}

impl TargetEvent {
    fn recorded_key(&self) -> RecordedKey {
        (
            self.rule_key.as_str().to_owned(),
            self.target_table.as_str().to_owned(),
            self.target_id,
        )
    }
}

pub struct RunAutomationsUseCase<R, E, T, L, A, G> {
    pub rules: R,
    pub entities: E,
    pub templates: T,
    pub ledger: L,
    pub mail_access: A,
    pub gateway: G,
    /// Tenant pipelines evaluated at once.
    pub tenant_concurrency: usize,
    /// Concurrent sends within one tenant (the gateway is rate-limited).
    pub send_concurrency: usize,
    /// Per-send bound; a timeout is an `error` outcome for that target only.
    pub send_timeout: Duration,
}

impl<R, E, T, L, A, G> RunAutomationsUseCase<R, E, T, L, A, G>
where
    R: RuleRepository,
    E: EntityRepository,
    T: TemplateRepository,
    L: OutcomeLedger,
    A: MailAccessProvider,
    G: MailGateway,
{
    /// Process the whole eligible tenant population once.
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<RunSummary, AutomationServiceError> {
        let by_tenant = self.rules.load_enabled().await?;
        let users = by_tenant.len() as u64;

        let mut pipelines = futures::stream::iter(by_tenant.into_iter().map(
            |(tenant_id, rules)| async move {
                match self.process_tenant(tenant_id, rules, now).await {
                    Ok(count) => count,
                    Err(e) => {
                        warn!(%tenant_id, error = %e.detail(), "tenant skipped");
                        0
                    }
                }
            },
        ))
        .buffer_unordered(self.tenant_concurrency.max(1));

        let mut processed = 0u64;
        while let Some(count) = pipelines.next().await {
            processed += count;
        }

        Ok(RunSummary { users, processed })
    }

    /// Run every enabled rule of one tenant against its records.
    /// Returns the number of ledger writes performed for this tenant.
    async fn process_tenant(
        &self,
        tenant_id: Uuid,
        rules: Vec<AutomationRule>,
        now: DateTime<Utc>,
    ) -> Result<u64, AutomationServiceError> {
        // The first rule that names a timezone wins for the whole rule set.
        let tz = calendar::parse_timezone(rules.iter().find_map(|r| r.config.timezone.as_deref()));
        let today = calendar::local_date(now, tz);
        let today_month_day = calendar::month_day_of(today);

        let needs_leads = rules
            .iter()
            .any(|r| r.key.family() == RuleFamily::BirthdayProspects);
        let needs_policies = rules
            .iter()
            .any(|r| r.key.family() == RuleFamily::PolicyRenewal);
        let needs_customers = needs_policies
            || rules
                .iter()
                .any(|r| r.key.family() == RuleFamily::BirthdayCustomers);

        // Three independent read-only queries; fetch only what the enabled
        // rules will actually look at, once per tenant.
        let (leads, customers, policies) = tokio::try_join!(
            async {
                if needs_leads {
                    self.entities.list_leads(tenant_id).await
                } else {
                    Ok(Vec::new())
                }
            },
            async {
                if needs_customers {
                    self.entities.list_customers(tenant_id).await
                } else {
                    Ok(Vec::new())
                }
            },
            async {
                if needs_policies {
                    self.entities.list_policies(tenant_id).await
                } else {
                    Ok(Vec::new())
                }
            },
        )?;

        let customers_by_id: HashMap<Uuid, &Customer> =
            customers.iter().map(|c| (c.id, c)).collect();

        let recorded = self.ledger.list_recorded(tenant_id, today).await?;

        // Lazy credential: only tenants with at least one *_email rule pay
        // for the token round-trip, and a failed acquisition downgrades the
        // tenant to token-less instead of aborting it.
        let access = if rules.iter().any(|r| r.key.channel() == RuleChannel::Email) {
            match self.mail_access.access_for(tenant_id).await {
                Ok(access) => Some(access),
                Err(e) => {
                    warn!(%tenant_id, error = %e.detail(), "mail access unavailable, email targets will be skipped");
                    None
                }
            }
        } else {
            None
        };

        // Tenant-scoped template cache: one fetch, shared by every target of
        // this tenant, discarded when the tenant is done.
        let template_ids: Vec<Uuid> = rules.iter().filter_map(|r| r.config.template_id).collect();
        let templates: HashMap<Uuid, MessageTemplate> = if template_ids.is_empty() {
            HashMap::new()
        } else {
            self.templates
                .list_by_ids(tenant_id, &template_ids)
                .await?
                .into_iter()
                .map(|t| (t.id, t))
                .collect()
        };

        let mut targets = Vec::new();
        for rule in &rules {
            match rule.key.family() {
                RuleFamily::BirthdayProspects => {
                    for lead in &leads {
                        let matches = lead
                            .birth_date
                            .as_deref()
                            .and_then(calendar::month_day)
                            .is_some_and(|md| md == today_month_day);
                        if matches {
                            targets.push(TargetEvent {
                                rule_key: rule.key,
                                template_id: rule.config.template_id,
                                target_table: TargetTable::Leads,
                                target_id: lead.id,
                                display_name: template::display_name(
                                    lead.name.as_deref(),
                                    lead.first_name.as_deref(),
                                    lead.last_name.as_deref(),
                                    template::FALLBACK_PROSPECT,
                                ),
                                email: lead.email.clone(),
                            });
                        }
                    }
                }
                RuleFamily::BirthdayCustomers => {
                    for customer in &customers {
                        let matches = customer
                            .birth_date
                            .as_deref()
                            .and_then(calendar::month_day)
                            .is_some_and(|md| md == today_month_day);
                        if matches {
                            targets.push(TargetEvent {
                                rule_key: rule.key,
                                template_id: rule.config.template_id,
                                target_table: TargetTable::Customers,
                                target_id: customer.id,
                                display_name: template::display_name(
                                    customer.name.as_deref(),
                                    customer.first_name.as_deref(),
                                    customer.last_name.as_deref(),
                                    template::FALLBACK_CUSTOMER,
                                ),
                                email: customer.email.clone(),
                            });
                        }
                    }
                }
                RuleFamily::PolicyRenewal => {
                    // Exact-day match: `days_before - 1` and `+ 1` do not fire.
                    let days_before = i64::from(rule.config.days_before_or_default());
                    for policy in &policies {
                        let matches = policy
                            .expiry_date
                            .as_deref()
                            .and_then(|raw| calendar::days_until(raw, today))
                            .is_some_and(|days| days == days_before);
                        if !matches {
                            continue;
                        }
                        let customer = policy
                            .customer_id
                            .and_then(|id| customers_by_id.get(&id).copied());
                        targets.push(TargetEvent {
                            rule_key: rule.key,
                            template_id: rule.config.template_id,
                            target_table: TargetTable::Policies,
                            target_id: policy.id,
                            display_name: customer
                                .map(|c| {
                                    template::display_name(
                                        c.name.as_deref(),
                                        c.first_name.as_deref(),
                                        c.last_name.as_deref(),
                                        template::FALLBACK_CUSTOMER,
                                    )
                                })
                                .unwrap_or_else(|| template::FALLBACK_CUSTOMER.to_owned()),
                            email: customer.and_then(|c| c.email.clone()),
                        });
                    }
                }
            }
        }

        // Targets already recorded for this run date are finished business:
        // a re-invocation of the same day must neither resend nor recount.
        targets.retain(|t| !recorded.contains(&t.recorded_key()));

        debug!(%tenant_id, run_date = %today, targets = targets.len(), "tenant evaluated");

        let access = access.as_ref();
        let templates = &templates;
        let mut outcomes = futures::stream::iter(targets.into_iter().map(|target| async move {
            self.process_target(tenant_id, today, target, access, templates)
                .await
        }))
        .buffer_unordered(self.send_concurrency.max(1));

        let mut processed = 0u64;
        while let Some(result) = outcomes.next().await {
            match result {
                Ok(()) => processed += 1,
                // The outcome write itself failed; nothing recorded for this
                // target today, so a later re-run may retry it.
                Err(e) => warn!(%tenant_id, error = %e.detail(), "outcome write failed"),
            }
        }

        Ok(processed)
    }

    /// Every branch in here ends in exactly one ledger write; nothing below
    /// the per-target level is allowed to escape as an error, except the
    /// write itself.
    async fn process_target(
        &self,
        tenant_id: Uuid,
        run_date: NaiveDate,
        target: TargetEvent,
        access: Option<&MailAccess>,
        templates: &HashMap<Uuid, MessageTemplate>,
    ) -> Result<(), AutomationServiceError> {
        let key = OutcomeKey {
            tenant_id,
            rule_key: target.rule_key,
            target_table: target.target_table,
            target_id: target.target_id,
            run_date,
        };

        let entry = match target.rule_key.channel() {
            RuleChannel::Notify => OutcomeEntry {
                key,
                status: OutcomeStatus::Ok,
                message: notify_message(target.rule_key.family(), &target.display_name),
                metadata: json!({}),
            },
            RuleChannel::Email => self.dispatch_email(key, &target, access, templates).await,
        };

        self.ledger.record_once(&entry).await?;
        Ok(())
    }

    /// Template resolution happens before dispatch, dispatch before the
    /// outcome is shaped — a send failure is reflected accurately.
    async fn dispatch_email(
        &self,
        key: OutcomeKey,
        target: &TargetEvent,
        access: Option<&MailAccess>,
        templates: &HashMap<Uuid, MessageTemplate>,
    ) -> OutcomeEntry {
        let Some(access) = access else {
            return OutcomeEntry {
                key,
                status: OutcomeStatus::Skipped,
                message: "Gmail no conectado".to_owned(),
                metadata: json!({}),
            };
        };

        let Some(to) = target.email.as_deref().and_then(template::normalize_email) else {
            return OutcomeEntry {
                key,
                status: OutcomeStatus::Skipped,
                message: "sin email válido".to_owned(),
                metadata: json!({}),
            };
        };

        let tenant_template = target.template_id.and_then(|id| templates.get(&id));
        let message = template::resolve(
            target.rule_key.family(),
            tenant_template,
            &target.display_name,
        );
        let mail = OutboundEmail {
            to: to.clone(),
            subject: message.subject,
            text: message.text,
            html: message.html,
        };

        match tokio::time::timeout(self.send_timeout, self.gateway.send(access, &mail)).await {
            Ok(Ok(())) => OutcomeEntry {
                key,
                status: OutcomeStatus::Ok,
                message: format!("Email enviado a {to}"),
                metadata: json!({ "to": to }),
            },
            Ok(Err(e)) => OutcomeEntry {
                key,
                status: OutcomeStatus::Error,
                message: truncate(&e.detail(), ERROR_MESSAGE_MAX),
                metadata: json!({ "to": to }),
            },
            Err(_) => OutcomeEntry {
                key,
                status: OutcomeStatus::Error,
                message: format!(
                    "envío cancelado: sin respuesta tras {}s",
                    self.send_timeout.as_secs()
                ),
                metadata: json!({ "to": to }),
            },
        }
    }
}

fn notify_message(family: RuleFamily, display_name: &str) -> String {
    match family {
        RuleFamily::BirthdayProspects | RuleFamily::BirthdayCustomers => {
            format!("Hoy es el cumpleaños de {display_name}")
        }
        RuleFamily::PolicyRenewal => {
            format!("La póliza de {display_name} está próxima a vencer")
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_owned()
    } else {
        text.chars().take(max_chars).collect()
    }
}
