use serde::Serialize;
use tracing::{error, info};

use super::{
    templates::{AutoReplyContext, NotificationContext},
    EmailTemplates, MailError, Mailer, OutgoingEmail,
};
use crate::{entities::contact::ContactSubmission, settings::AppConfig};

/// Result of one delivery attempt. Failures are reported, never retried.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl DeliveryReport {
    fn from_result(result: Result<String, MailError>) -> Self {
        match result {
            Ok(message_id) => DeliveryReport { success: true, message_id: Some(message_id), error: None },
            Err(e) => DeliveryReport { success: false, message_id: None, error: Some(e.to_string()) },
        }
    }
}

/// Composes and sends the owner notification and the sender auto-reply.
pub struct EmailService<M>
where
    M: Mailer,
{
    pub mailer: M,
    templates: EmailTemplates,
    from: String,
    notify_to: String,
    owner_name: String,
}

impl<M> EmailService<M>
where
    M: Mailer,
{
    pub fn new(mailer: M, config: &AppConfig) -> Result<Self, MailError> {
        Ok(EmailService {
            mailer,
            templates: EmailTemplates::new()?,
            from: config.mail_from_address().to_string(),
            notify_to: config.mail_to_address().to_string(),
            owner_name: config.owner_name.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.mailer.is_configured()
    }

    /// Tells the site owner about a new submission.
    pub async fn send_contact_notification(&self, contact: &ContactSubmission) -> DeliveryReport {
        let ctx = NotificationContext {
            name: &contact.name,
            email: &contact.email,
            message: &contact.message,
            submitted_at: contact.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ip_address: contact.ip_address.as_deref().unwrap_or("unknown"),
        };

        let result = match self.templates.render_notification(&ctx) {
            Ok(rendered) => {
                self.mailer.send(OutgoingEmail {
                    from: self.from.clone(),
                    to: self.notify_to.clone(),
                    subject: format!("New Contact Form Message from {}", contact.name),
                    html_body: rendered.html_body,
                    text_body: rendered.text_body,
                }).await
            }
            Err(e) => Err(e),
        };

        let report = DeliveryReport::from_result(result);
        match &report.error {
            None => info!("Contact notification sent for {} ({:?})", contact.id, report.message_id),
            Some(e) => error!("Contact notification failed for {}: {}", contact.id, e),
        }
        report
    }

    /// Thanks the sender for getting in touch.
    pub async fn send_auto_reply(&self, to: &str, name: &str) -> DeliveryReport {
        let ctx = AutoReplyContext { name, owner_name: &self.owner_name };

        let result = match self.templates.render_auto_reply(&ctx) {
            Ok(rendered) => {
                self.mailer.send(OutgoingEmail {
                    from: self.from.clone(),
                    to: to.to_string(),
                    subject: format!("Thank you for your message - {}", self.owner_name),
                    html_body: rendered.html_body,
                    text_body: rendered.text_body,
                }).await
            }
            Err(e) => Err(e),
        };

        let report = DeliveryReport::from_result(result);
        match &report.error {
            None => info!("Auto-reply sent ({:?})", report.message_id),
            Some(e) => error!("Auto-reply sending failed: {}", e),
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use uuid::Uuid;

    use crate::entities::contact::ContactStatus;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: OutgoingEmail) -> Result<String, MailError> {
            if self.fail {
                return Err(MailError::Transport("connection reset".into()));
            }
            self.sent.lock().push(email);
            Ok("<test@example.com>".into())
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    fn config() -> AppConfig {
        AppConfig {
            smtp_username: "owner@example.com".into(),
            owner_name: "Grace Hopper".into(),
            ..AppConfig::default()
        }
    }

    fn contact() -> ContactSubmission {
        let now = Utc::now();
        ContactSubmission {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            message: "Hello there, friend!".into(),
            ip_address: Some("203.0.113.9".into()),
            user_agent: None,
            status: ContactStatus::Pending,
            email_sent: false,
            email_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[actix_web::test]
    async fn notification_goes_to_owner() {
        let service = EmailService::new(RecordingMailer::default(), &config()).unwrap();

        let report = service.send_contact_notification(&contact()).await;
        assert!(report.success);
        assert_eq!(report.message_id.as_deref(), Some("<test@example.com>"));

        let sent = service.mailer.sent.lock();
        assert_eq!(sent[0].to, "owner@example.com");
        assert_eq!(sent[0].from, "owner@example.com");
        assert_eq!(sent[0].subject, "New Contact Form Message from Ada");
    }

    #[actix_web::test]
    async fn auto_reply_goes_to_sender() {
        let service = EmailService::new(RecordingMailer::default(), &config()).unwrap();

        let report = service.send_auto_reply("ada@example.com", "Ada").await;
        assert!(report.success);

        let sent = service.mailer.sent.lock();
        assert_eq!(sent[0].to, "ada@example.com");
        assert_eq!(sent[0].subject, "Thank you for your message - Grace Hopper");
    }

    #[actix_web::test]
    async fn transport_failure_is_reported_not_raised() {
        let mailer = RecordingMailer { fail: true, ..RecordingMailer::default() };
        let service = EmailService::new(mailer, &config()).unwrap();

        let report = service.send_contact_notification(&contact()).await;
        assert!(!report.success);
        assert!(report.message_id.is_none());
        assert_eq!(report.error.as_deref(), Some("SMTP send failed: connection reset"));
    }
}
