pub mod mailgun;
pub mod mock;
pub mod smtp;

use async_trait::async_trait;
use thiserror::Error;

pub use mailgun::MailgunProvider;
pub use mock::MockEmailProvider;
pub use smtp::SmtpProvider;

/// Upper bound on a single delivery attempt, connect included.
pub const DELIVERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

impl ProviderError {
    pub fn is_not_configured(&self) -> bool {
        matches!(self, ProviderError::NotConfigured(_))
    }
}

/// Acknowledgement from a provider that accepted a message.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Provider-assigned message id, when the provider returns one.
    pub provider_id: Option<String>,
}

impl ProviderResponse {
    pub fn accepted(provider_id: Option<String>) -> Self {
        Self { provider_id }
    }
}

/// A rendered notification, ready for any provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: String,
    pub reply_to: Option<String>,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Stable identifier used in logs, metrics and the `via` response field.
    fn name(&self) -> &'static str;

    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError>;

    /// Whether the provider currently has enough settings to attempt a send.
    fn is_configured(&self) -> bool;
}
