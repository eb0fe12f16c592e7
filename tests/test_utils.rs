use std::{sync::Arc, time::Duration};

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use uuid::Uuid;

use portfolio_contact_api::{
    entities::contact::{
        ContactStats, ContactStatus, ContactSubmission, ContactSummary, DeliveryUpdate,
        NewContactSubmission,
    },
    errors::AppError,
    limiter::rate_limiter::RateLimiter,
    mail::{MailError, Mailer, OutgoingEmail},
    repositories::contact::ContactRepository,
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment},
    AppState,
};

pub const ADMIN_KEY: &str = "test-admin-key-0123456789";
pub const OWNER_EMAIL: &str = "owner@example.com";
pub const TEST_PEER: &str = "198.51.100.7:40000";

mock! {
    pub ContactRepo {}

    #[async_trait]
    impl ContactRepository for ContactRepo {
        async fn check_connection(&self) -> Result<(), AppError>;
        async fn has_recent_submission(&self, email: &str, since: DateTime<Utc>) -> Result<bool, AppError>;
        async fn create_submission(&self, submission: &NewContactSubmission) -> Result<ContactSubmission, AppError>;
        async fn update_delivery(&self, id: &Uuid, update: &DeliveryUpdate) -> Result<(), AppError>;
        async fn contact_stats(&self) -> Result<ContactStats, AppError>;
        async fn recent_submissions(&self, limit: i64) -> Result<Vec<ContactSummary>, AppError>;
        async fn list_submissions(&self, limit: i64, offset: i64) -> Result<Vec<ContactSubmission>, AppError>;
        async fn count_submissions(&self) -> Result<i64, AppError>;
    }
}

mock! {
    pub Outbox {}

    #[async_trait]
    impl Mailer for Outbox {
        async fn send(&self, email: OutgoingEmail) -> Result<String, MailError>;
        fn is_configured(&self) -> bool;
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Portfolio Contact Test".to_string(),
        database_url: "postgres://unused@127.0.0.1:5432/unused".into(),
        smtp_username: OWNER_EMAIL.into(),
        owner_name: "Test Owner".into(),
        admin_api_key: Some(ADMIN_KEY.into()),
        ..AppConfig::default()
    }
}

pub fn app_state_with(config: &AppConfig, repo: MockContactRepo, mailer: MockOutbox) -> web::Data<AppState> {
    let state = AppState::from_parts(config, Arc::new(repo), Arc::new(mailer), None)
        .expect("Failed to build app state");
    web::Data::new(state)
}

pub fn app_state(repo: MockContactRepo, mailer: MockOutbox) -> web::Data<AppState> {
    app_state_with(&test_config(), repo, mailer)
}

pub fn limiter(max: u64) -> RateLimiter {
    RateLimiter::new("rl:contact:test", max, Duration::from_secs(15 * 60), None)
}

pub fn test_app(
    state: web::Data<AppState>,
    limiter: RateLimiter,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .configure(|cfg| configure_routes(cfg, limiter, false))
}

/// What the database would hand back right after the insert.
pub fn stored(new: &NewContactSubmission) -> ContactSubmission {
    let now = Utc::now();
    ContactSubmission {
        id: Uuid::new_v4(),
        name: new.name.clone(),
        email: new.email.clone(),
        message: new.message.clone(),
        ip_address: new.ip_address.clone(),
        user_agent: new.user_agent.clone(),
        status: ContactStatus::Pending,
        email_sent: false,
        email_sent_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn summary(name: &str, status: ContactStatus) -> ContactSummary {
    ContactSummary {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        message: "Hello, I would like to talk.".to_string(),
        status,
        created_at: Utc::now(),
    }
}

pub fn valid_form() -> serde_json::Value {
    serde_json::json!({
        "name": "  Ada Lovelace ",
        "email": " Ada@Example.COM ",
        "message": "I would love to collaborate on a project."
    })
}

/// Repository that accepts everything: no duplicates, inserts succeed.
pub fn accepting_repo() -> MockContactRepo {
    let mut repo = MockContactRepo::new();
    repo.expect_has_recent_submission().returning(|_, _| Ok(false));
    repo.expect_create_submission().returning(|new| Ok(stored(new)));
    repo.expect_update_delivery().returning(|_, _| Ok(()));
    repo
}

/// Mailer that delivers everything.
pub fn delivering_mailer() -> MockOutbox {
    let mut mailer = MockOutbox::new();
    mailer.expect_is_configured().return_const(true);
    mailer.expect_send().returning(|_| Ok(format!("<{}@example.com>", Uuid::new_v4())));
    mailer
}
