//! Message template resolution and placeholder substitution.
//!
//! A rule may point at a tenant template; otherwise a built-in Spanish
//! default per rule family is used. Either way the text passes through
//! name-placeholder substitution, so defaults and custom templates behave
//! identically from the recipient's point of view.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::domain::types::{MessageTemplate, RuleFamily};

/// Generic recipient nouns used when no name field is usable.
pub const FALLBACK_CUSTOMER: &str = "Cliente";
pub const FALLBACK_PROSPECT: &str = "Prospecto";

/// The only supported placeholders, with optional `{..}`/`[[..]]` wrappers.
/// Case-insensitive, whole-token: `client_names` or `xclient_name` never
/// match. Anything else in the template is left verbatim.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\{\[]{0,2}\s*\b(?:client_name|nombre_cliente|nombre_prospecto)\b\s*[\}\]]{0,2}")
        .expect("placeholder pattern is valid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

/// Subject/body ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMessage {
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// Replace every supported placeholder with the recipient's display name.
pub fn apply_placeholders(input: &str, display_name: &str) -> String {
    PLACEHOLDER
        .replace_all(input, NoExpand(display_name))
        .into_owned()
}

/// Trimmed lowercase address if it has a basic `local@domain.tld` shape.
pub fn normalize_email(raw: &str) -> Option<String> {
    let candidate = raw.trim().to_lowercase();
    EMAIL.is_match(&candidate).then_some(candidate)
}

/// Resolution order: combined name field, then first+last joined by a single
/// space, then the generic noun.
pub fn display_name(
    full: Option<&str>,
    first: Option<&str>,
    last: Option<&str>,
    fallback: &str,
) -> String {
    if let Some(full) = full {
        let full = full.trim();
        if !full.is_empty() {
            return full.to_owned();
        }
    }
    let joined = format!(
        "{} {}",
        first.unwrap_or_default().trim(),
        last.unwrap_or_default().trim()
    );
    let joined = joined.trim();
    if joined.is_empty() {
        fallback.to_owned()
    } else {
        joined.to_owned()
    }
}

/// Resolve the message for one target: the tenant's template when configured
/// and found, the family default otherwise. Both go through substitution.
pub fn resolve(
    family: RuleFamily,
    template: Option<&MessageTemplate>,
    display_name: &str,
) -> ResolvedMessage {
    match template {
        Some(template) => ResolvedMessage {
            subject: apply_placeholders(&template.subject, display_name),
            text: apply_placeholders(&template.text, display_name),
            html: template
                .html
                .as_deref()
                .map(|html| apply_placeholders(html, display_name)),
        },
        None => default_message(family, display_name),
    }
}

fn default_message(family: RuleFamily, name: &str) -> ResolvedMessage {
    match family {
        RuleFamily::BirthdayProspects | RuleFamily::BirthdayCustomers => ResolvedMessage {
            subject: format!("Feliz cumpleaños, {name}"),
            text: format!(
                "¡Feliz cumpleaños, {name}! Te deseamos un excelente día de parte de tu agente de seguros."
            ),
            html: None,
        },
        RuleFamily::PolicyRenewal => ResolvedMessage {
            subject: "Recordatorio: tu póliza está por vencer".to_owned(),
            text: format!(
                "Hola {name}, te recordamos que tu póliza está próxima a vencer. Contacta a tu agente para renovarla a tiempo."
            ),
            html: None,
        },
    }
}
