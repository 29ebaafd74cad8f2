//! Primary-then-fallback delivery.
//!
//! The primary provider is always tried first. Any failure there, including
//! missing settings, hands the message to the fallback exactly once. The
//! fallback's own error is logged and reduced to "did not deliver"; the
//! caller only ever sees the primary's error text.

use super::metrics::record_provider_call;
use super::providers::{EmailMessage, EmailProvider, ProviderError, ProviderResponse};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPath {
    Primary,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub provider: &'static str,
    pub path: DeliveryPath,
    pub response: ProviderResponse,
}

#[derive(Debug)]
pub struct DeliveryFailure {
    pub primary: ProviderError,
    pub fallback_attempted: bool,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fallback_attempted {
            write!(f, "{}; fallback delivery also failed", self.primary)
        } else {
            write!(f, "{}; no fallback provider configured", self.primary)
        }
    }
}

impl std::error::Error for DeliveryFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.primary)
    }
}

pub struct Notifier {
    primary: Arc<dyn EmailProvider>,
    fallback: Arc<dyn EmailProvider>,
}

impl Notifier {
    pub fn new(primary: Arc<dyn EmailProvider>, fallback: Arc<dyn EmailProvider>) -> Self {
        Self { primary, fallback }
    }

    pub fn primary_name(&self) -> &'static str {
        self.primary.name()
    }

    pub fn fallback_name(&self) -> &'static str {
        self.fallback.name()
    }

    pub async fn deliver(&self, message: &EmailMessage) -> Result<Delivery, DeliveryFailure> {
        let primary_error = match self.primary.send(message).await {
            Ok(response) => {
                record_provider_call(self.primary.name(), "success");
                return Ok(Delivery {
                    provider: self.primary.name(),
                    path: DeliveryPath::Primary,
                    response,
                });
            }
            Err(e) => {
                let status = if e.is_not_configured() {
                    "not_configured"
                } else {
                    "failure"
                };
                record_provider_call(self.primary.name(), status);
                tracing::warn!(
                    provider = self.primary.name(),
                    error = %e,
                    "Primary delivery failed, trying fallback"
                );
                e
            }
        };

        match self.try_fallback(message).await {
            FallbackOutcome::Delivered(response) => Ok(Delivery {
                provider: self.fallback.name(),
                path: DeliveryPath::Fallback,
                response,
            }),
            FallbackOutcome::Failed => Err(DeliveryFailure {
                primary: primary_error,
                fallback_attempted: true,
            }),
            FallbackOutcome::NotConfigured => Err(DeliveryFailure {
                primary: primary_error,
                fallback_attempted: false,
            }),
        }
    }

    async fn try_fallback(&self, message: &EmailMessage) -> FallbackOutcome {
        if !self.fallback.is_configured() {
            record_provider_call(self.fallback.name(), "not_configured");
            tracing::debug!(provider = self.fallback.name(), "Fallback not configured");
            return FallbackOutcome::NotConfigured;
        }

        match self.fallback.send(message).await {
            Ok(response) => {
                record_provider_call(self.fallback.name(), "success");
                tracing::info!(provider = self.fallback.name(), "Delivered via fallback");
                FallbackOutcome::Delivered(response)
            }
            // Settings vanished between the check and the send.
            Err(e) if e.is_not_configured() => {
                record_provider_call(self.fallback.name(), "not_configured");
                FallbackOutcome::NotConfigured
            }
            Err(e) => {
                record_provider_call(self.fallback.name(), "failure");
                tracing::error!(
                    provider = self.fallback.name(),
                    error = %e,
                    "Fallback delivery failed"
                );
                FallbackOutcome::Failed
            }
        }
    }
}

enum FallbackOutcome {
    Delivered(ProviderResponse),
    Failed,
    NotConfigured,
}
