use super::{EmailMessage, EmailProvider, ProviderError, ProviderResponse, DELIVERY_TIMEOUT};
use crate::config::{resolve_fallback, EnvSource};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;

/// Mailgun messages API, used as the HTTP fallback.
pub struct MailgunProvider {
    env: Arc<dyn EnvSource>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl MailgunProvider {
    pub fn new(env: Arc<dyn EnvSource>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { env, client })
    }
}

#[async_trait]
impl EmailProvider for MailgunProvider {
    fn name(&self) -> &'static str {
        "mailgun"
    }

    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError> {
        let config = resolve_fallback(self.env.as_ref()).ok_or_else(|| {
            ProviderError::NotConfigured(
                "Mailgun is not configured: set MAILGUN_API_KEY and MAILGUN_DOMAIN".to_string(),
            )
        })?;

        let from = config.from_header().map_err(|e| {
            ProviderError::Configuration(format!(
                "Invalid Mailgun sender '{}': {}",
                config.from_address, e
            ))
        })?;
        let mut form: Vec<(&str, &str)> = vec![
            ("from", from.as_str()),
            ("to", email.to.as_str()),
            ("subject", email.subject.as_str()),
            ("html", email.body_html.as_str()),
        ];
        if let Some(reply_to) = &email.reply_to {
            form.push(("h:Reply-To", reply_to.as_str()));
        }

        let response = self
            .client
            .post(config.messages_url())
            .basic_auth("api", Some(config.api_key.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Connection(format!("Failed to connect to Mailgun: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::SendFailed(format!(
                "Mailgun API returned error status {}: {}",
                status, body
            )));
        }

        // The body is informational only; a 2xx means the message was queued.
        let parsed = response.json::<MailgunResponse>().await.ok();
        let provider_id = parsed.as_ref().and_then(|r| r.id.clone());

        tracing::info!(
            to = %email.to,
            domain = %config.domain,
            id = ?provider_id,
            status = ?parsed.and_then(|r| r.message),
            "Email sent successfully via Mailgun"
        );

        Ok(ProviderResponse::accepted(provider_id))
    }

    fn is_configured(&self) -> bool {
        resolve_fallback(self.env.as_ref()).is_some()
    }
}
