use super::{EmailMessage, EmailProvider, ProviderError, ProviderResponse, DELIVERY_TIMEOUT};
use crate::config::{resolve_delivery, DeliveryConfig, EnvSource};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;

/// Port on which SMTP servers expect TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Authenticated SMTP relay. Settings are resolved on every send.
pub struct SmtpProvider {
    env: Arc<dyn EnvSource>,
    timeout: Duration,
}

impl SmtpProvider {
    pub fn new(env: Arc<dyn EnvSource>) -> Self {
        Self {
            env,
            timeout: DELIVERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn transport(
        &self,
        config: &DeliveryConfig,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, ProviderError> {
        let creds = Credentials::new(
            config.user.clone(),
            config.secret.expose_secret().clone(),
        );

        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| {
            ProviderError::Configuration(format!("Failed to create SMTP relay: {}", e))
        })?;

        Ok(builder
            .port(config.port)
            .credentials(creds)
            .timeout(Some(self.timeout))
            .build())
    }
}

/// Build the single-part HTML message for one recipient.
pub fn build_message(
    config: &DeliveryConfig,
    email: &EmailMessage,
) -> Result<Message, ProviderError> {
    let from_address: Address = config
        .from_address
        .parse()
        .map_err(|e| ProviderError::Configuration(format!("Invalid from address: {}", e)))?;
    let from_mailbox = Mailbox::new(Some(config.from_name.clone()), from_address);

    let to_mailbox: Mailbox = email
        .to
        .parse()
        .map_err(|e| ProviderError::InvalidRecipient(format!("{}: {}", email.to, e)))?;

    let mut message_builder = Message::builder()
        .from(from_mailbox)
        .to(to_mailbox)
        .subject(&email.subject);

    // A bad reply-to never blocks delivery.
    if let Some(reply_to) = &email.reply_to {
        match reply_to.parse::<Mailbox>() {
            Ok(mailbox) => message_builder = message_builder.reply_to(mailbox),
            Err(e) => {
                tracing::warn!(reply_to = %reply_to, error = %e, "Skipping invalid reply-to")
            }
        }
    }

    message_builder
        .header(ContentType::TEXT_HTML)
        .body(email.body_html.clone())
        .map_err(|e| ProviderError::SendFailed(format!("Failed to build message: {}", e)))
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError> {
        let config = resolve_delivery(self.env.as_ref()).ok_or_else(|| {
            ProviderError::NotConfigured(
                "SMTP is not configured: set SMTP_HOST, SMTP_PORT, SMTP_USER and SMTP_PASS, \
                 or GMAIL_USER and GMAIL_APP_PASSWORD"
                    .to_string(),
            )
        })?;

        let message = build_message(&config, email)?;
        let transport = self.transport(&config)?;

        tracing::debug!(
            host = %config.host,
            port = config.port,
            credentials = config.source.as_str(),
            "Submitting message to SMTP relay"
        );

        let response = transport
            .send(message)
            .await
            .map_err(|e| ProviderError::SendFailed(format!("Failed to send email: {}", e)))?;

        let provider_id = response.message().next().map(|s| s.to_string());

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            host = %config.host,
            "Email sent successfully"
        );

        Ok(ProviderResponse::accepted(provider_id))
    }

    fn is_configured(&self) -> bool {
        resolve_delivery(self.env.as_ref()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialSource;
    use secrecy::Secret;
    use std::collections::HashMap;

    fn delivery_config() -> DeliveryConfig {
        DeliveryConfig {
            host: "127.0.0.1".to_string(),
            port: 587,
            user: "bot@acme.test".to_string(),
            secret: Secret::new("secret".to_string()),
            from_name: "Acme Site".to_string(),
            from_address: "bot@acme.test".to_string(),
            source: CredentialSource::Direct,
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: "owner@acme.test".to_string(),
            subject: "New contact request".to_string(),
            body_html: "<p>Name: Ada</p>".to_string(),
            reply_to: Some("ada@example.com".to_string()),
        }
    }

    #[test]
    fn test_build_message_headers() {
        let message = build_message(&delivery_config(), &message()).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("Acme Site"));
        assert!(formatted.contains("<bot@acme.test>"));
        assert!(formatted.contains("owner@acme.test"));
        assert!(formatted.contains("Reply-To: ada@example.com"));
        assert!(formatted.contains("Content-Type: text/html; charset=utf-8"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let mut email = message();
        email.to = "nobody".to_string();

        let err = build_message(&delivery_config(), &email).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRecipient(_)));
    }

    #[tokio::test]
    async fn test_send_without_settings_is_not_configured() {
        let provider = SmtpProvider::new(Arc::new(HashMap::<String, String>::new()));
        assert!(!provider.is_configured());

        let err = provider.send(&message()).await.unwrap_err();
        assert!(err.is_not_configured());
        assert!(err.to_string().contains("SMTP is not configured"));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_send_failure() {
        let env: HashMap<String, String> = [
            ("SMTP_HOST", "127.0.0.1"),
            ("SMTP_PORT", "1"),
            ("SMTP_USER", "bot@acme.test"),
            ("SMTP_PASS", "secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let provider = SmtpProvider::new(Arc::new(env)).with_timeout(Duration::from_secs(2));
        assert!(provider.is_configured());

        let err = provider.send(&message()).await.unwrap_err();
        assert!(matches!(err, ProviderError::SendFailed(_)));
    }
}
