use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_server")]
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub sender_password: Option<String>,
    #[serde(default)]
    pub recipient_email: Option<String>,
    #[serde(default = "default_smtp_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_timeout_seconds() -> u64 {
    15
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: default_smtp_server(),
            port: default_smtp_port(),
            sender_email: None,
            sender_password: None,
            recipient_email: None,
            timeout_seconds: default_smtp_timeout_seconds(),
        }
    }
}

impl SmtpConfig {
    /// Sender, password and recipient are all set.
    pub fn is_configured(&self) -> bool {
        [&self.sender_email, &self.sender_password, &self.recipient_email]
            .iter()
            .all(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP is not configured")]
    NotConfigured,
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Body of `POST /api/contact`
#[derive(Debug, Clone, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name must not be empty".to_string());
        }
        if !self.email.contains('@') {
            return Err("A valid email address is required".to_string());
        }
        if self.message.trim().is_empty() {
            return Err("Message must not be empty".to_string());
        }
        Ok(())
    }

    fn subject(&self) -> String {
        format!("New portfolio message - {}", self.name.trim())
    }

    fn body(&self) -> String {
        format!(
            "New message from your portfolio contact form:\n\n\
             Name: {}\n\
             Email: {}\n\n\
             Message:\n{}\n\n\
             ---\n\
             Sent from the portfolio contact form. Reply to the address above, not to this email.\n",
            self.name.trim(),
            self.email.trim(),
            self.message
        )
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_contact(&self, message: &ContactMessage) -> Result<(), MailError>;
}

/// STARTTLS SMTP delivery to the configured recipient.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        if !config.is_configured() {
            return Err(MailError::NotConfigured);
        }
        let (Some(sender), Some(password), Some(recipient)) = (
            config.sender_email.as_deref(),
            config.sender_password.as_deref(),
            config.recipient_email.as_deref(),
        ) else {
            return Err(MailError::NotConfigured);
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
            .port(config.port)
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .timeout(Some(Duration::from_secs(config.timeout_seconds)))
            .build();

        Ok(Self {
            transport,
            from: sender.parse()?,
            to: recipient.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_contact(&self, message: &ContactMessage) -> Result<(), MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(message.subject());
        // The visitor's address is only a reply hint; a malformed one is skipped.
        if let Ok(reply_to) = message.email.trim().parse::<Mailbox>() {
            builder = builder.reply_to(reply_to);
        }
        let email = builder
            .header(ContentType::TEXT_PLAIN)
            .body(message.body())?;

        self.transport.send(email).await?;
        Ok(())
    }
}

/// What happened to a submitted contact message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Sent,
    StoredUnconfigured,
    StoredAfterFailure,
}

impl ContactOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ContactOutcome::Sent => "Message sent successfully!",
            ContactOutcome::StoredUnconfigured => {
                "Message received. Email delivery is not configured on the server."
            }
            ContactOutcome::StoredAfterFailure => {
                "Message received. Automatic email delivery failed."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ContactStats {
    pub contact_messages_count: u64,
    pub sent_messages_count: u64,
}

/// Contact form handling. Delivery problems never reach the visitor; the
/// message is logged instead.
pub struct ContactService {
    mailer: Option<Arc<dyn Mailer>>,
    received: AtomicU64,
    sent: AtomicU64,
}

impl ContactService {
    pub fn new(mailer: Option<Arc<dyn Mailer>>) -> Self {
        Self {
            mailer,
            received: AtomicU64::new(0),
            sent: AtomicU64::new(0),
        }
    }

    /// SMTP delivery when configured, log-only otherwise.
    pub fn from_config(config: &SmtpConfig) -> Self {
        match SmtpMailer::new(config) {
            Ok(mailer) => Self::new(Some(Arc::new(mailer))),
            Err(MailError::NotConfigured) => {
                info!("SMTP not configured, contact messages will only be logged");
                Self::new(None)
            }
            Err(e) => {
                warn!("SMTP configuration rejected, contact messages will only be logged: {}", e);
                Self::new(None)
            }
        }
    }

    pub fn is_delivery_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    pub async fn submit(&self, message: &ContactMessage) -> ContactOutcome {
        self.received.fetch_add(1, Ordering::Relaxed);

        let Some(mailer) = &self.mailer else {
            log_contact(message, false);
            return ContactOutcome::StoredUnconfigured;
        };

        match mailer.send_contact(message).await {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                log_contact(message, true);
                ContactOutcome::Sent
            }
            Err(e) => {
                warn!("Failed to deliver contact message: {}", e);
                log_contact(message, false);
                ContactOutcome::StoredAfterFailure
            }
        }
    }

    pub fn stats(&self) -> ContactStats {
        ContactStats {
            contact_messages_count: self.received.load(Ordering::Relaxed),
            sent_messages_count: self.sent.load(Ordering::Relaxed),
        }
    }
}

fn log_contact(message: &ContactMessage, sent_by_email: bool) {
    info!(
        name = %message.name,
        email = %message.email,
        sent_by_email,
        "Contact message: {}",
        message.message
    );
}
