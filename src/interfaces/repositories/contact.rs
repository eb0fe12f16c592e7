use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    entities::contact::{ContactStats, ContactSubmission, ContactSummary, DeliveryUpdate, NewContactSubmission},
    errors::AppError,
    repositories::sqlx_repo::SqlxContactRepo,
};

const SUBMISSION_COLUMNS: &str = r#"
    id, name, email, message, ip_address, user_agent, status,
    email_sent, email_sent_at, created_at, updated_at
"#;

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn has_recent_submission(&self, email: &str, since: DateTime<Utc>) -> Result<bool, AppError>;
    async fn create_submission(&self, submission: &NewContactSubmission) -> Result<ContactSubmission, AppError>;
    async fn update_delivery(&self, id: &Uuid, update: &DeliveryUpdate) -> Result<(), AppError>;
    async fn contact_stats(&self) -> Result<ContactStats, AppError>;
    async fn recent_submissions(&self, limit: i64) -> Result<Vec<ContactSummary>, AppError>;
    async fn list_submissions(&self, limit: i64, offset: i64) -> Result<Vec<ContactSubmission>, AppError>;
    async fn count_submissions(&self) -> Result<i64, AppError>;
}

#[async_trait]
impl<T> ContactRepository for Arc<T>
where
    T: ContactRepository + ?Sized,
{
    async fn check_connection(&self) -> Result<(), AppError> {
        (**self).check_connection().await
    }

    async fn has_recent_submission(&self, email: &str, since: DateTime<Utc>) -> Result<bool, AppError> {
        (**self).has_recent_submission(email, since).await
    }

    async fn create_submission(&self, submission: &NewContactSubmission) -> Result<ContactSubmission, AppError> {
        (**self).create_submission(submission).await
    }

    async fn update_delivery(&self, id: &Uuid, update: &DeliveryUpdate) -> Result<(), AppError> {
        (**self).update_delivery(id, update).await
    }

    async fn contact_stats(&self) -> Result<ContactStats, AppError> {
        (**self).contact_stats().await
    }

    async fn recent_submissions(&self, limit: i64) -> Result<Vec<ContactSummary>, AppError> {
        (**self).recent_submissions(limit).await
    }

    async fn list_submissions(&self, limit: i64, offset: i64) -> Result<Vec<ContactSubmission>, AppError> {
        (**self).list_submissions(limit, offset).await
    }

    async fn count_submissions(&self) -> Result<i64, AppError> {
        (**self).count_submissions().await
    }
}

impl SqlxContactRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxContactRepo { pool }
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn has_recent_submission(&self, email: &str, since: DateTime<Utc>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM contact_submissions WHERE email = $1 AND created_at >= $2)"
        )
        .bind(email)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_submission(&self, submission: &NewContactSubmission) -> Result<ContactSubmission, AppError> {
        let query = format!(
            r#"
            INSERT INTO contact_submissions (name, email, message, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SUBMISSION_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, ContactSubmission>(&query)
            .bind(&submission.name)
            .bind(&submission.email)
            .bind(&submission.message)
            .bind(&submission.ip_address)
            .bind(&submission.user_agent)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn update_delivery(&self, id: &Uuid, update: &DeliveryUpdate) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE contact_submissions
            SET
                status = $2,
                email_sent = $3,
                email_sent_at = $4,
                updated_at = NOW()
            WHERE id = $1
            "#
        )
        .bind(id)
        .bind(update.status.as_str())
        .bind(update.email_sent())
        .bind(update.email_sent_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Contact submission not found".into()));
        }

        Ok(())
    }

    async fn contact_stats(&self) -> Result<ContactStats, AppError> {
        let stats = sqlx::query_as::<_, ContactStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'sent') AS sent,
                COUNT(*) FILTER (WHERE status = 'failed') AS failed,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending
            FROM contact_submissions
            "#
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    async fn recent_submissions(&self, limit: i64) -> Result<Vec<ContactSummary>, AppError> {
        let recent = sqlx::query_as::<_, ContactSummary>(
            r#"
            SELECT id, name, email, message, status, created_at
            FROM contact_submissions
            ORDER BY created_at DESC
            LIMIT $1
            "#
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(recent)
    }

    async fn list_submissions(&self, limit: i64, offset: i64) -> Result<Vec<ContactSubmission>, AppError> {
        let query = format!(
            r#"
            SELECT {SUBMISSION_COLUMNS}
            FROM contact_submissions
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        );

        let contacts = sqlx::query_as::<_, ContactSubmission>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(contacts)
    }

    async fn count_submissions(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_submissions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
