use super::{EmailMessage, EmailProvider, ProviderError, ProviderResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory provider for tests and local runs.
pub struct MockEmailProvider {
    name: &'static str,
    failure: Option<String>,
    configured: bool,
    send_count: AtomicU64,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailProvider {
    /// Accepts every message.
    pub fn succeeding(name: &'static str) -> Self {
        Self {
            name,
            failure: None,
            configured: true,
            send_count: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Rejects every message with `SendFailed(reason)`.
    pub fn failing(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::succeeding(name)
        }
    }

    /// Behaves like a provider with no settings.
    pub fn unconfigured(name: &'static str) -> Self {
        Self {
            configured: false,
            ..Self::succeeding(name)
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError> {
        self.send_count.fetch_add(1, Ordering::SeqCst);

        if !self.configured {
            return Err(ProviderError::NotConfigured(format!(
                "{} is not configured",
                self.name
            )));
        }

        if let Some(reason) = &self.failure {
            return Err(ProviderError::SendFailed(reason.clone()));
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            provider = self.name,
            "[MOCK] Email would be sent"
        );

        Ok(ProviderResponse::accepted(Some(format!(
            "mock-{}-{}",
            self.name,
            self.send_count()
        ))))
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
