use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

/// The closed set of supported automation rules.
///
/// Storage keeps these as strings; everything past the repository boundary
/// works with this enum so that every branch over rule kinds is checked at
/// compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKey {
    BirthdayProspectsEmail,
    BirthdayProspectsNotify,
    BirthdayCustomersEmail,
    BirthdayCustomersNotify,
    PolicyRenewalNoticeEmail,
    PolicyRenewalNoticeNotify,
}

impl RuleKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BirthdayProspectsEmail => "birthday_prospects_email",
            Self::BirthdayProspectsNotify => "birthday_prospects_notify",
            Self::BirthdayCustomersEmail => "birthday_customers_email",
            Self::BirthdayCustomersNotify => "birthday_customers_notify",
            Self::PolicyRenewalNoticeEmail => "policy_renewal_notice_email",
            Self::PolicyRenewalNoticeNotify => "policy_renewal_notice_notify",
        }
    }

    /// Returns `None` for keys outside the closed set.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "birthday_prospects_email" => Some(Self::BirthdayProspectsEmail),
            "birthday_prospects_notify" => Some(Self::BirthdayProspectsNotify),
            "birthday_customers_email" => Some(Self::BirthdayCustomersEmail),
            "birthday_customers_notify" => Some(Self::BirthdayCustomersNotify),
            "policy_renewal_notice_email" => Some(Self::PolicyRenewalNoticeEmail),
            "policy_renewal_notice_notify" => Some(Self::PolicyRenewalNoticeNotify),
            _ => None,
        }
    }

    pub fn family(self) -> RuleFamily {
        match self {
            Self::BirthdayProspectsEmail | Self::BirthdayProspectsNotify => {
                RuleFamily::BirthdayProspects
            }
            Self::BirthdayCustomersEmail | Self::BirthdayCustomersNotify => {
                RuleFamily::BirthdayCustomers
            }
            Self::PolicyRenewalNoticeEmail | Self::PolicyRenewalNoticeNotify => {
                RuleFamily::PolicyRenewal
            }
        }
    }

    pub fn channel(self) -> RuleChannel {
        match self {
            Self::BirthdayProspectsEmail
            | Self::BirthdayCustomersEmail
            | Self::PolicyRenewalNoticeEmail => RuleChannel::Email,
            Self::BirthdayProspectsNotify
            | Self::BirthdayCustomersNotify
            | Self::PolicyRenewalNoticeNotify => RuleChannel::Notify,
        }
    }

    /// The collection this rule's targets come from.
    pub fn target_table(self) -> TargetTable {
        match self.family() {
            RuleFamily::BirthdayProspects => TargetTable::Leads,
            RuleFamily::BirthdayCustomers => TargetTable::Customers,
            RuleFamily::PolicyRenewal => TargetTable::Policies,
        }
    }
}

/// The condition a rule evaluates, independent of its dispatch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFamily {
    BirthdayProspects,
    BirthdayCustomers,
    PolicyRenewal,
}

/// Whether a rule sends an email or only records an internal notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleChannel {
    Email,
    Notify,
}

/// Accepted `days_before` window for renewal rules.
pub const DAYS_BEFORE_MIN: u32 = 1;
pub const DAYS_BEFORE_MAX: u32 = 120;
const DAYS_BEFORE_DEFAULT: u32 = 30;

/// Typed view of a rule's `config` jsonb blob.
///
/// The rules UI historically wrote both snake_case and camelCase keys, so both
/// spellings are accepted. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    #[serde(alias = "daysBefore")]
    pub days_before: Option<u32>,
    pub timezone: Option<String>,
    #[serde(alias = "templateId")]
    pub template_id: Option<Uuid>,
}

impl RuleConfig {
    /// `days_before` clamped into the accepted window, defaulting to 30.
    pub fn days_before_or_default(&self) -> u32 {
        self.days_before
            .unwrap_or(DAYS_BEFORE_DEFAULT)
            .clamp(DAYS_BEFORE_MIN, DAYS_BEFORE_MAX)
    }
}

/// One enabled per-tenant rule, as loaded by the rule store.
#[derive(Debug, Clone)]
pub struct AutomationRule {
    pub tenant_id: Uuid,
    pub key: RuleKey,
    pub config: RuleConfig,
}

/// Prospect snapshot. Name and date fields mirror the loose CRM storage.
#[derive(Debug, Clone)]
pub struct Lead {
    pub id: Uuid,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<String>,
}

/// Customer snapshot.
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: Uuid,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<String>,
}

/// Policy snapshot; joined to its customer in memory by `customer_id`.
#[derive(Debug, Clone)]
pub struct Policy {
    pub id: Uuid,
    pub policy_number: String,
    pub customer_id: Option<Uuid>,
    pub expiry_date: Option<String>,
}

/// Tenant-scoped message template.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    pub id: Uuid,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// Logical source collection of a target, as recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetTable {
    Leads,
    Customers,
    Policies,
}

impl TargetTable {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leads => "leads",
            Self::Customers => "customers",
            Self::Policies => "policies",
        }
    }
}

/// Terminal state of one processed target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Ok,
    Skipped,
    Error,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }
}

/// Natural key of a ledger row: at most one row may ever exist per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutcomeKey {
    pub tenant_id: Uuid,
    pub rule_key: RuleKey,
    pub target_table: TargetTable,
    pub target_id: Uuid,
    pub run_date: NaiveDate,
}

/// One outcome to be appended to the ledger.
#[derive(Debug, Clone)]
pub struct OutcomeEntry {
    pub key: OutcomeKey,
    pub status: OutcomeStatus,
    pub message: String,
    pub metadata: serde_json::Value,
}

/// Aggregate counts returned to the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tenants that had at least one enabled rule.
    pub users: u64,
    /// Ledger writes performed (or re-confirmed) during this run.
    pub processed: u64,
}

/// Per-tenant mail credential, acquired at most once per run.
#[derive(Debug, Clone)]
pub struct MailAccess {
    pub access_token: String,
    /// Address the provider reports as the sending account, if known.
    pub sender: Option<String>,
}

/// Fully composed message handed to the mail gateway.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}
