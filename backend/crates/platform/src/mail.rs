//! Outbound Email
//!
//! Two transports behind one [`Mailer`]:
//! - [`Outbox`]: in-process store of the most recent messages, used in
//!   development and tests
//! - [`HttpMailer`]: JSON POST to a mail relay API

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

/// Number of messages the outbox retains
pub const OUTBOX_CAPACITY: usize = 100;

/// Mail dispatch errors
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail relay request failed: {0}")]
    Transport(String),

    #[error("Mail relay rejected message with status {0}")]
    Rejected(u16),
}

/// A message to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Mail transport trait
#[trait_variant::make(MailTransport: Send)]
pub trait LocalMailTransport {
    /// Deliver one message
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

// ============================================================================
// Outbox
// ============================================================================

/// A message captured by the [`Outbox`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentEmail {
    pub id: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// In-memory outbox keeping the latest [`OUTBOX_CAPACITY`] messages
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    sent: Arc<RwLock<VecDeque<SentEmail>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// All retained messages, oldest first
    pub async fn all(&self) -> Vec<SentEmail> {
        self.sent.read().await.iter().cloned().collect()
    }

    /// Messages sent to `recipient` (case-insensitive), oldest first
    pub async fn for_recipient(&self, recipient: &str) -> Vec<SentEmail> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|mail| mail.to.eq_ignore_ascii_case(recipient))
            .cloned()
            .collect()
    }

    /// Most recent message sent to `recipient`
    pub async fn latest_for(&self, recipient: &str) -> Option<SentEmail> {
        self.sent
            .read()
            .await
            .iter()
            .rev()
            .find(|mail| mail.to.eq_ignore_ascii_case(recipient))
            .cloned()
    }
}

impl MailTransport for Outbox {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let mail = SentEmail {
            id: format!("email_{}", random_suffix()),
            to: message.to.clone(),
            subject: message.subject.clone(),
            text: message.body.clone(),
            sent_at: Utc::now(),
        };

        let mut sent = self.sent.write().await;
        sent.push_back(mail);
        while sent.len() > OUTBOX_CAPACITY {
            sent.pop_front();
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Email captured in outbox");
        Ok(())
    }
}

fn random_suffix() -> String {
    crate::crypto::random_bytes(8)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

// ============================================================================
// HTTP relay
// ============================================================================

/// HTTP mail relay settings
#[derive(Debug, Clone)]
pub struct HttpMailerConfig {
    /// Relay endpoint accepting `{from, to, subject, text}` as JSON
    pub endpoint: String,
    /// Sent as a bearer token when present
    pub api_key: Option<String>,
    /// Sender address
    pub from: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Mail transport posting to an HTTP relay
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    config: Arc<HttpMailerConfig>,
}

impl HttpMailer {
    pub fn new(config: HttpMailerConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }
}

impl MailTransport for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let payload = RelayPayload {
            from: &self.config.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let mut request = self.client.post(&self.config.endpoint).json(&payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MailError::Rejected(response.status().as_u16()));
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

// ============================================================================
// Mailer
// ============================================================================

/// The mail transport selected at startup
#[derive(Debug, Clone)]
pub enum Mailer {
    Outbox(Outbox),
    Http(HttpMailer),
}

impl Mailer {
    /// The outbox, when this mailer captures instead of delivering
    pub fn outbox(&self) -> Option<&Outbox> {
        match self {
            Mailer::Outbox(outbox) => Some(outbox),
            Mailer::Http(_) => None,
        }
    }
}

impl MailTransport for Mailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        match self {
            Mailer::Outbox(outbox) => MailTransport::send(outbox, message).await,
            Mailer::Http(http) => MailTransport::send(http, message).await,
        }
    }
}
