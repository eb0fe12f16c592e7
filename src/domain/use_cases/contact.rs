use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    entities::contact::{
        ClientInfo, ContactForm, ContactListData, ContactStatsData, ContactSubmission,
        DeliveryUpdate, ListQuery, Pagination,
    },
    errors::AppError,
    mail::{EmailService, Mailer},
    repositories::contact::ContactRepository,
};

pub const RECENT_MESSAGES_LIMIT: i64 = 10;

pub struct ContactHandler<R, M>
where
    R: ContactRepository,
    M: Mailer,
{
    pub contact_repo: R,
    pub email_service: EmailService<M>,
    pub duplicate_window: Duration,
}

impl<R, M> ContactHandler<R, M>
where
    R: ContactRepository,
    M: Mailer,
{
    pub fn new(contact_repo: R, email_service: EmailService<M>, duplicate_window: Duration) -> Self {
        ContactHandler {
            contact_repo,
            email_service,
            duplicate_window,
        }
    }

    /// Accepts one contact form submission.
    ///
    /// Rejects the same email within the duplicate window, stores the
    /// record as pending, sends both emails and records whether the owner
    /// notification went out.
    pub async fn submit(&self, form: ContactForm, client: ClientInfo) -> Result<ContactSubmission, AppError> {
        let form = form.normalized();
        form.validate()?;

        let since = Utc::now() - self.duplicate_window;
        if self.contact_repo.has_recent_submission(&form.email, since).await? {
            tracing::info!("Duplicate contact submission rejected");
            return Err(AppError::DuplicateSubmission);
        }

        let mut contact = self.contact_repo
            .create_submission(&form.into_insert(client))
            .await?;

        tracing::info!(contact_id = %contact.id, "Contact submission stored");

        let notification = self.email_service.send_contact_notification(&contact).await;
        let auto_reply = self.email_service.send_auto_reply(&contact.email, &contact.name).await;

        if !auto_reply.success {
            tracing::warn!(contact_id = %contact.id, "Auto-reply was not delivered");
        }

        let update = if notification.success {
            DeliveryUpdate::sent(Utc::now())
        } else {
            DeliveryUpdate::failed()
        };

        self.contact_repo.update_delivery(&contact.id, &update).await?;

        contact.status = update.status;
        contact.email_sent = update.email_sent();
        contact.email_sent_at = update.email_sent_at;

        Ok(contact)
    }

    /// Status counts plus the most recent submissions.
    pub async fn stats(&self) -> Result<ContactStatsData, AppError> {
        let stats = self.contact_repo.contact_stats().await?;
        let recent_messages = self.contact_repo.recent_submissions(RECENT_MESSAGES_LIMIT).await?;

        Ok(ContactStatsData { stats, recent_messages })
    }

    /// One page of submissions, newest first.
    pub async fn list(&self, query: &ListQuery) -> Result<ContactListData, AppError> {
        let total = self.contact_repo.count_submissions().await?;
        let pagination = Pagination::new(query.page(), query.limit(), total);

        let contacts = self.contact_repo
            .list_submissions(pagination.limit, pagination.offset())
            .await?;

        Ok(ContactListData { contacts, pagination })
    }

    pub async fn check_database(&self) -> Result<(), AppError> {
        self.contact_repo.check_connection().await
    }
}
