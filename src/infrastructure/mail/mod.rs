//! Outgoing email: transport abstraction, SMTP implementation, templates,
//! and the service that composes the two contact-form emails.

pub mod service;
pub mod smtp;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use derive_more::Display;

pub use service::{DeliveryReport, EmailService};
pub use smtp::SmtpMailer;
pub use templates::EmailTemplates;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[derive(Debug, Display, PartialEq)]
pub enum MailError {
    #[display("Email delivery is not configured")]
    NotConfigured,

    #[display("Invalid email address: {_0}")]
    InvalidAddress(String),

    #[display("Failed to build email: {_0}")]
    Build(String),

    #[display("Template error: {_0}")]
    Template(String),

    #[display("SMTP send failed: {_0}")]
    Transport(String),
}

impl std::error::Error for MailError {}

/// Delivers a fully rendered email. Returns the Message-ID on success.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<String, MailError>;

    fn is_configured(&self) -> bool;
}

#[async_trait]
impl<T> Mailer for Arc<T>
where
    T: Mailer + ?Sized,
{
    async fn send(&self, email: OutgoingEmail) -> Result<String, MailError> {
        (**self).send(email).await
    }

    fn is_configured(&self) -> bool {
        (**self).is_configured()
    }
}
