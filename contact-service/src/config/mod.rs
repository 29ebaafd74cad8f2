pub mod delivery;
pub mod env;

use axum::http::HeaderValue;
use lettre::Address;
use service_core::config as core_config;
use service_core::error::AppError;

pub use delivery::{
    resolve_delivery, resolve_fallback, CredentialSource, DeliveryConfig, FallbackConfig,
};
pub use env::{EnvSource, ProcessEnv};

/// Recipient overrides, highest priority first.
pub const RECIPIENT_KEYS: &[&str] = &[
    "CONTACT_TO_EMAIL",
    "TARGET_EMAIL",
    "CONTACT_RECIPIENT",
    "TO_EMAIL",
];
pub const DEFAULT_RECIPIENT: &str = "contact@example.com";
pub const DEFAULT_SUBJECT: &str = "New contact request";
pub const DEFAULT_SITE_NAME: &str = "the website";

#[derive(Debug, Clone)]
pub struct ContactConfig {
    pub common: core_config::Config,
    /// Resolved once at startup and reported by `/health`.
    pub recipient: String,
    pub subject: String,
    pub site_name: String,
    pub cors: CorsPolicy,
}

/// Allowed browser origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    Any,
    Origins(Vec<HeaderValue>),
}

impl CorsPolicy {
    /// `CORS_ALLOW_ALL` forces the wildcard. Otherwise `FRONTEND_URL` (comma
    /// separated) lists the origins; with neither set every origin is allowed,
    /// which suits local development.
    pub fn from_env(env: &dyn EnvSource) -> Result<Self, AppError> {
        if env.flag("CORS_ALLOW_ALL") {
            return Ok(CorsPolicy::Any);
        }

        let Some(raw) = env.non_empty("FRONTEND_URL") else {
            return Ok(CorsPolicy::Any);
        };

        let origins = raw
            .split(',')
            .map(|o| o.trim().trim_end_matches('/'))
            .filter(|o| !o.is_empty())
            .map(|o| {
                if o == "*" {
                    return Ok(None);
                }
                HeaderValue::from_str(o).map(Some).map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if origins.iter().any(Option::is_none) || origins.is_empty() {
            return Ok(CorsPolicy::Any);
        }

        Ok(CorsPolicy::Origins(origins.into_iter().flatten().collect()))
    }
}

impl ContactConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_env(common_config, &ProcessEnv)
    }

    pub fn from_env(common: core_config::Config, env: &dyn EnvSource) -> Result<Self, AppError> {
        let recipient = resolve_recipient(env)?;
        let cors = CorsPolicy::from_env(env)?;

        match &cors {
            CorsPolicy::Any => tracing::info!("CORS: allowing any origin"),
            CorsPolicy::Origins(origins) => {
                tracing::info!(origins = ?origins, "CORS: allowing configured origins")
            }
        }

        Ok(ContactConfig {
            common,
            recipient,
            subject: env
                .non_empty("CONTACT_SUBJECT")
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            site_name: env
                .non_empty("SITE_NAME")
                .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
            cors,
        })
    }
}

fn resolve_recipient(env: &dyn EnvSource) -> Result<String, AppError> {
    let recipient = env
        .first_of(RECIPIENT_KEYS)
        .unwrap_or_else(|| DEFAULT_RECIPIENT.to_string());

    recipient.parse::<Address>().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "Invalid recipient address '{}': {}",
            recipient,
            e
        ))
    })?;

    Ok(recipient)
}
