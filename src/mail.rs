//! Outbound notification e-mail.
//!
//! [`SmtpMailer`] wraps the `lettre` async SMTP transport. When `SMTP_HOST` is not
//! configured the server runs with [`LogMailer`], which only writes the message to
//! the log. Tests use [`MockMailer`].

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::sync::{Arc, Mutex};

use crate::config::SmtpConfig;
use crate::models::ContactSubmission;

/// Error type for e-mail delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

/// A plain-text message ready to be handed to a [`Mailer`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

pub type MailerState = Arc<dyn Mailer>;

/// SmtpMailer
///
/// Delivers mail through a STARTTLS relay. The transport keeps its own connection
/// pool, so one instance is shared by all requests.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: config.from_address.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(reply_to.parse()?);
        }
        let message = builder
            .body(email.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport.send(message).await?;
        tracing::info!(to = %email.to, subject = %email.subject, "Notification email sent");
        Ok(())
    }
}

/// LogMailer
///
/// Stand-in used when no SMTP relay is configured.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "SMTP not configured, email logged instead of sent"
        );
        Ok(())
    }
}

/// MockMailer
///
/// Records every message it is asked to send; `should_fail` simulates a relay outage.
#[derive(Clone, Default)]
pub struct MockMailer {
    pub should_fail: bool,
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if self.should_fail {
            return Err(MailError::Build("Mock Mailer Error: Simulation requested".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }
        Ok(())
    }
}

/// Builds the sales notification for a new contact-form submission.
pub fn contact_notification(submission: &ContactSubmission, recipient: &str) -> OutgoingEmail {
    let subject = match &submission.subject {
        Some(s) if !s.trim().is_empty() => format!("[Contact] {}", s.trim()),
        _ => format!("[Contact] Message from {}", submission.name),
    };
    let mut body = format!("Name: {}\nEmail: {}\n", submission.name, submission.email);
    if let Some(company) = &submission.company {
        body.push_str(&format!("Company: {company}\n"));
    }
    if let Some(phone) = &submission.phone {
        body.push_str(&format!("Phone: {phone}\n"));
    }
    body.push_str(&format!(
        "Received: {}\n\n{}\n",
        submission.created_at.to_rfc3339(),
        submission.message
    ));

    OutgoingEmail {
        to: recipient.to_string(),
        reply_to: Some(submission.email.clone()),
        subject,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_includes_sender_details() {
        let submission = ContactSubmission {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            company: Some("Analytical Engines".into()),
            message: "Please send a quote for the BE-500.".into(),
            ..Default::default()
        };
        let email = contact_notification(&submission, "sales@example.com");
        assert_eq!(email.to, "sales@example.com");
        assert_eq!(email.reply_to.as_deref(), Some("ada@example.com"));
        assert_eq!(email.subject, "[Contact] Message from Ada");
        assert!(email.body.contains("Company: Analytical Engines"));
        assert!(email.body.contains("quote for the BE-500"));
    }

    #[tokio::test]
    async fn mock_mailer_records_and_fails_on_demand() {
        let email = OutgoingEmail {
            to: "a@example.com".into(),
            reply_to: None,
            subject: "s".into(),
            body: "b".into(),
        };
        let mailer = MockMailer::new();
        mailer.send(&email).await.unwrap();
        assert_eq!(mailer.sent(), vec![email.clone()]);

        assert!(MockMailer::new_failing().send(&email).await.is_err());
    }
}
