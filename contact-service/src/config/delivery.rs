//! Per-send resolution of outbound mail settings.
//!
//! Nothing here is cached: every send attempt re-reads the [`EnvSource`], so
//! credentials rotated in the environment take effect on the next request.

use super::env::EnvSource;
use lettre::address::AddressError;
use lettre::message::Mailbox;
use lettre::Address;
use secrecy::Secret;

pub const SMTP_HOST: &str = "SMTP_HOST";
pub const SMTP_PORT: &str = "SMTP_PORT";
pub const SMTP_USER: &str = "SMTP_USER";
pub const SMTP_PASS_KEYS: &[&str] = &["SMTP_PASS", "SMTP_PASSWORD"];

pub const GMAIL_USER_KEYS: &[&str] = &["GMAIL_USER", "GMAIL_ADDRESS"];
pub const GMAIL_APP_PASSWORD_KEYS: &[&str] = &["GMAIL_APP_PASSWORD", "GMAIL_PASSWORD"];
pub const GMAIL_SMTP_HOST: &str = "smtp.gmail.com";
pub const GMAIL_SMTP_PORT: u16 = 587;

pub const FROM_NAME_KEYS: &[&str] = &["FROM_NAME", "SMTP_FROM_NAME"];
pub const FROM_EMAIL_KEYS: &[&str] = &["FROM_EMAIL", "SMTP_FROM_EMAIL"];
pub const DEFAULT_FROM_NAME: &str = "Website Contact";
pub const DEFAULT_FROM_ADDRESS: &str = "no-reply@example.com";

pub const MAILGUN_API_KEY: &str = "MAILGUN_API_KEY";
pub const MAILGUN_DOMAIN: &str = "MAILGUN_DOMAIN";
pub const MAILGUN_FROM: &str = "MAILGUN_FROM";
pub const MAILGUN_BASE_URL: &str = "MAILGUN_BASE_URL";
pub const DEFAULT_MAILGUN_BASE_URL: &str = "https://api.mailgun.net";

/// Which set of variables produced a [`DeliveryConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Direct,
    Gmail,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Direct => "smtp",
            CredentialSource::Gmail => "gmail",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub secret: Secret<String>,
    pub from_name: String,
    pub from_address: String,
    pub source: CredentialSource,
}

/// Resolve SMTP settings: direct `SMTP_*` variables first, then the Gmail
/// aliases. `None` means neither set is complete.
pub fn resolve_delivery(env: &dyn EnvSource) -> Option<DeliveryConfig> {
    let (host, port, user, secret, source) =
        direct_credentials(env).or_else(|| gmail_credentials(env))?;
    let (from_name, from_address) = sender_identity(env, Some(&user));

    Some(DeliveryConfig {
        host,
        port,
        user,
        secret: Secret::new(secret),
        from_name,
        from_address,
        source,
    })
}

type Credentials = (String, u16, String, String, CredentialSource);

fn direct_credentials(env: &dyn EnvSource) -> Option<Credentials> {
    let host = env.non_empty(SMTP_HOST)?;
    let raw_port = env.non_empty(SMTP_PORT)?;
    let user = env.non_empty(SMTP_USER)?;
    let secret = env.first_of(SMTP_PASS_KEYS)?;

    let port = match raw_port.parse::<u16>() {
        Ok(port) => port,
        Err(_) => {
            tracing::warn!(
                port = %raw_port,
                "Ignoring SMTP_* settings: SMTP_PORT is not a valid port"
            );
            return None;
        }
    };

    Some((host, port, user, secret, CredentialSource::Direct))
}

fn gmail_credentials(env: &dyn EnvSource) -> Option<Credentials> {
    let user = env.first_of(GMAIL_USER_KEYS)?;
    let app_password = normalize_app_password(&env.first_of(GMAIL_APP_PASSWORD_KEYS)?);
    if app_password.is_empty() {
        return None;
    }

    Some((
        GMAIL_SMTP_HOST.to_string(),
        GMAIL_SMTP_PORT,
        user,
        app_password,
        CredentialSource::Gmail,
    ))
}

/// Google displays app passwords in space-separated groups of four;
/// operators paste them that way.
pub fn normalize_app_password(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Display name and address for the `From` header.
///
/// The address falls back to the authenticated user when that is an email
/// address, then to a fixed no-reply address.
pub fn sender_identity(env: &dyn EnvSource, user: Option<&str>) -> (String, String) {
    let from_name = env
        .first_of(FROM_NAME_KEYS)
        .unwrap_or_else(|| DEFAULT_FROM_NAME.to_string());
    let from_address = env
        .first_of(FROM_EMAIL_KEYS)
        .or_else(|| user.filter(|u| u.contains('@')).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string());

    (from_name, from_address)
}

/// Settings for the Mailgun HTTP fallback.
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    pub api_key: Secret<String>,
    pub domain: String,
    pub from_name: String,
    pub from_address: String,
    pub base_url: String,
}

impl FallbackConfig {
    pub fn messages_url(&self) -> String {
        format!(
            "{}/v3/{}/messages",
            self.base_url.trim_end_matches('/'),
            self.domain
        )
    }

    /// RFC 5322 mailbox for Mailgun's `from` field; the display name is
    /// quoted when it contains specials such as commas.
    pub fn from_header(&self) -> Result<String, AddressError> {
        let address = self.from_address.parse::<Address>()?;
        Ok(Mailbox::new(Some(self.from_name.clone()), address).to_string())
    }
}

/// Resolve the Mailgun fallback. Needs an API key and a sending domain; the
/// sender defaults to `no-reply@<domain>`.
pub fn resolve_fallback(env: &dyn EnvSource) -> Option<FallbackConfig> {
    let api_key = env.non_empty(MAILGUN_API_KEY)?;
    let domain = env.non_empty(MAILGUN_DOMAIN)?;

    let (from_name, _) = sender_identity(env, None);
    let from_address = env
        .non_empty(MAILGUN_FROM)
        .or_else(|| env.first_of(FROM_EMAIL_KEYS))
        .unwrap_or_else(|| format!("no-reply@{}", domain));
    let base_url = env
        .non_empty(MAILGUN_BASE_URL)
        .unwrap_or_else(|| DEFAULT_MAILGUN_BASE_URL.to_string());

    Some(FallbackConfig {
        api_key: Secret::new(api_key),
        domain,
        from_name,
        from_address,
        base_url,
    })
}
