use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{MailError, Mailer, OutgoingEmail};
use crate::settings::{AppConfig, SmtpTls};

/// SMTP delivery over lettre's async transport.
///
/// Without credentials the mailer is built in a disabled state and every
/// send fails with [`MailError::NotConfigured`].
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    message_id_domain: String,
}

impl SmtpMailer {
    pub fn new(config: &AppConfig) -> Result<Self, MailError> {
        let message_id_domain = config
            .mail_from_address()
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_string())
            .unwrap_or_else(|| "localhost".to_string());

        if !config.smtp_configured() {
            warn!("SMTP credentials missing; contact emails will not be delivered");
            return Ok(SmtpMailer { transport: None, message_id_domain });
        }

        let tls = match config.smtp_tls {
            SmtpTls::Tls => Tls::Wrapper(tls_parameters(&config.smtp_host)?),
            SmtpTls::Starttls => Tls::Required(tls_parameters(&config.smtp_host)?),
            SmtpTls::None => Tls::None,
        };

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port)
            .tls(tls)
            .credentials(credentials)
            .timeout(Some(Duration::from_secs(config.smtp_timeout_secs)))
            .build();

        info!(
            "SMTP mailer ready ({}:{}, tls: {:?})",
            config.smtp_host, config.smtp_port, config.smtp_tls
        );

        Ok(SmtpMailer { transport: Some(transport), message_id_domain })
    }

    fn build_message(&self, email: OutgoingEmail, message_id: String) -> Result<Message, MailError> {
        let from: Mailbox = email.from
            .parse()
            .map_err(|_| MailError::InvalidAddress(email.from.clone()))?;
        let to: Mailbox = email.to
            .parse()
            .map_err(|_| MailError::InvalidAddress(email.to.clone()))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject)
            .message_id(Some(message_id))
            .multipart(MultiPart::alternative_plain_html(email.text_body, email.html_body))
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

fn tls_parameters(host: &str) -> Result<TlsParameters, MailError> {
    TlsParameters::new(host.to_string()).map_err(|e| MailError::Build(format!("TLS configuration error: {}", e)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<String, MailError> {
        let transport = self.transport.as_ref().ok_or(MailError::NotConfigured)?;

        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.message_id_domain);
        let recipient = email.to.clone();
        let message = self.build_message(email, message_id.clone())?;

        debug!("Sending email {} to {}", message_id, recipient);

        transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(message_id)
    }

    fn is_configured(&self) -> bool {
        self.transport.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            from: "owner@example.com".into(),
            to: "visitor@example.com".into(),
            subject: "Hello".into(),
            html_body: "<p>Hi</p>".into(),
            text_body: "Hi".into(),
        }
    }

    #[actix_web::test]
    async fn unconfigured_mailer_refuses_to_send() {
        let mailer = SmtpMailer::new(&AppConfig::default()).unwrap();
        assert!(!mailer.is_configured());
        assert_eq!(mailer.send(email()).await, Err(MailError::NotConfigured));
    }

    #[test]
    fn invalid_recipient_is_reported() {
        let mailer = SmtpMailer::new(&AppConfig::default()).unwrap();
        let mut bad = email();
        bad.to = "not an address".into();

        let err = mailer.build_message(bad, "<id@example.com>".into()).unwrap_err();
        assert_eq!(err, MailError::InvalidAddress("not an address".into()));
    }

    #[test]
    fn message_builds_for_valid_addresses() {
        let mailer = SmtpMailer::new(&AppConfig::default()).unwrap();
        assert!(mailer.build_message(email(), "<id@example.com>".into()).is_ok());
    }
}
