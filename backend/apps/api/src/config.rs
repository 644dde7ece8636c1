//! Server Configuration
//!
//! Read once from the environment at startup.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose;
use platform::mail::{HttpMailer, HttpMailerConfig, Mailer, Outbox};
use platform::password::HashCost;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:5173";
const MAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the binary reads from the environment
pub struct ApiConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub connect_timeout: Duration,
    pub frontend_origins: Vec<String>,
    pub mail: Option<HttpMailerConfig>,
    pub seed_developer: Option<(String, String)>,
    pub auth: AuthConfig,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let development = match var("APP_ENV").as_deref() {
            Some("development") => true,
            Some("production") => false,
            Some(other) => bail!("APP_ENV must be development or production, got {other}"),
            None => cfg!(debug_assertions),
        };

        let mut auth = if development {
            AuthConfig::development()
        } else {
            AuthConfig::default()
        };

        match var("TOKEN_SECRET") {
            Some(secret) => auth.token_secret = secret.into_bytes(),
            None if development => {
                tracing::warn!("TOKEN_SECRET not set, using a random secret for this process");
            }
            None => bail!("TOKEN_SECRET must be set in production"),
        }

        if let Some(ttl) = parse::<u64>("TOKEN_TTL_SECS")? {
            auth.token_ttl = Duration::from_secs(ttl);
        }
        if let Some(emails) = var("DEVELOPER_EMAILS") {
            auth = auth.with_developer_emails(emails.split(',').filter(|e| !e.trim().is_empty()));
        }

        let default_cost = HashCost::default();
        auth.hash_cost = HashCost {
            memory_kib: parse("PASSWORD_HASH_MEMORY_KIB")?.unwrap_or(default_cost.memory_kib),
            iterations: parse("PASSWORD_HASH_ITERATIONS")?.unwrap_or(default_cost.iterations),
            parallelism: parse("PASSWORD_HASH_PARALLELISM")?.unwrap_or(default_cost.parallelism),
        };

        if let Some(pepper) = var("PASSWORD_PEPPER") {
            let bytes = general_purpose::STANDARD
                .decode(pepper.trim())
                .context("PASSWORD_PEPPER must be base64")?;
            auth.password_pepper = Some(bytes);
        }
        if let Some(disclose) = parse::<bool>("RESET_DISCLOSES_UNKNOWN_EMAIL")? {
            auth.reset_discloses_unknown_email = disclose;
        }

        let mail = match (var("MAIL_API_URL"), var("MAIL_FROM")) {
            (Some(endpoint), Some(from)) => Some(HttpMailerConfig {
                endpoint,
                api_key: var("MAIL_API_KEY"),
                from,
                timeout: MAIL_TIMEOUT,
            }),
            (Some(_), None) => bail!("MAIL_FROM must be set when MAIL_API_URL is"),
            _ => None,
        };

        let seed_developer = match (var("SEED_DEVELOPER_EMAIL"), var("SEED_DEVELOPER_PASSWORD")) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            port: parse("PORT")?.unwrap_or(DEFAULT_PORT),
            database_url: var("DATABASE_URL"),
            connect_timeout: Duration::from_secs(
                parse("DATABASE_CONNECT_TIMEOUT_SECS")?.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
            frontend_origins: parse_origins(
                &var("FRONTEND_ORIGINS").unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string()),
            )?,
            mail,
            seed_developer,
            auth,
        })
    }

    /// The relay mailer when configured, otherwise the in-process outbox
    pub fn mailer(&self) -> anyhow::Result<Mailer> {
        match &self.mail {
            Some(config) => Ok(Mailer::Http(HttpMailer::new(config.clone())?)),
            None => {
                tracing::info!("MAIL_API_URL not set, emails go to the development outbox");
                Ok(Mailer::Outbox(Outbox::new()))
            }
        }
    }
}

/// Comma-separated CORS origins. Credentials are allowed, so `*` is not.
fn parse_origins(raw: &str) -> anyhow::Result<Vec<String>> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect();

    if origins.iter().any(|origin| origin == "*") {
        bail!("FRONTEND_ORIGINS cannot contain `*`; list the allowed origins explicitly");
    }
    Ok(origins)
}

/// Non-empty value of `key`
fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|v| v.trim().parse::<T>().with_context(|| format!("{key} is invalid")))
        .transpose()
}
