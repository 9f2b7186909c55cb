//! HTTP collaborators: the per-tenant mail token service and the mail gateway.
//!
//! The gateway speaks the Gmail `users/me/messages/send` shape: a bearer
//! token and a base64url-encoded RFC 2822 message under a `raw` key. The base
//! URL is configurable so tests and staging can point elsewhere.

use anyhow::{Context as _, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::repository::{MailAccessProvider, MailGateway};
use crate::domain::types::{MailAccess, OutboundEmail};
use crate::error::AutomationServiceError;

// ── Token service ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpMailAccessProvider {
    pub http: reqwest::Client,
    pub token_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    email: Option<String>,
}

impl MailAccessProvider for HttpMailAccessProvider {
    async fn access_for(&self, tenant_id: Uuid) -> Result<MailAccess, AutomationServiceError> {
        let url = format!(
            "{}/tenants/{tenant_id}/mail-token",
            self.token_url.trim_end_matches('/')
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("request mail token")?;
        if !response.status().is_success() {
            return Err(anyhow!("token service answered {}", response.status()).into());
        }
        let token: TokenResponse = response
            .json()
            .await
            .context("decode mail token response")?;
        Ok(MailAccess {
            access_token: token.access_token,
            sender: token.email,
        })
    }
}

// ── Mail gateway ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpMailGateway {
    pub http: reqwest::Client,
    pub api_url: String,
}

impl MailGateway for HttpMailGateway {
    async fn send(
        &self,
        access: &MailAccess,
        mail: &OutboundEmail,
    ) -> Result<(), AutomationServiceError> {
        let url = format!(
            "{}/gmail/v1/users/me/messages/send",
            self.api_url.trim_end_matches('/')
        );
        let raw = URL_SAFE.encode(compose_rfc2822(access.sender.as_deref(), mail));
        let response = self
            .http
            .post(&url)
            .bearer_auth(&access.access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await
            .context("send mail")?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "mail gateway rejected send: {status} {}",
                body.trim()
            )
            .into());
        }
        Ok(())
    }
}

/// RFC 2047 B-encoding for header values that are not plain ASCII.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_owned()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

fn compose_rfc2822(from: Option<&str>, mail: &OutboundEmail) -> String {
    let mut message = String::new();
    if let Some(from) = from {
        message.push_str(&format!("From: {from}\r\n"));
    }
    message.push_str(&format!("To: {}\r\n", mail.to));
    message.push_str(&format!("Subject: {}\r\n", encode_header(&mail.subject)));
    message.push_str("MIME-Version: 1.0\r\n");

    match &mail.html {
        Some(html) => {
            let boundary = format!("=_{}", Uuid::new_v4().simple());
            message.push_str(&format!(
                "Content-Type: multipart/alternative; boundary=\"{boundary}\"\r\n\r\n"
            ));
            message.push_str(&format!("--{boundary}\r\n"));
            message.push_str("Content-Type: text/plain; charset=\"UTF-8\"\r\n\r\n");
            message.push_str(&mail.text);
            message.push_str(&format!("\r\n--{boundary}\r\n"));
            message.push_str("Content-Type: text/html; charset=\"UTF-8\"\r\n\r\n");
            message.push_str(html);
            message.push_str(&format!("\r\n--{boundary}--\r\n"));
        }
        None => {
            message.push_str("Content-Type: text/plain; charset=\"UTF-8\"\r\n\r\n");
            message.push_str(&mail.text);
            message.push_str("\r\n");
        }
    }
    message
}
