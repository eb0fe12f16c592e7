use std::sync::Arc;

use deadpool_redis::Pool as RedisPool;
use zeroize::Zeroizing;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod cors;
pub mod graceful_shutdown;
pub mod background_task;
pub mod telemetry;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{db, limiter, mail, utils};

use constants::CONTACT_RATE_LIMIT_PREFIX;
use limiter::rate_limiter::RateLimiter;
use mail::{EmailService, MailError, Mailer, SmtpMailer};
use repositories::{contact::ContactRepository, sqlx_repo::SqlxContactRepo};
use use_cases::contact::ContactHandler;

pub struct AppState {
    pub contact_handler: AppContactHandler,
    pub redis_pool: Option<RedisPool>,
    pub admin_api_key: Option<Zeroizing<String>>,
    pub trust_x_forwarded_for: bool,
    pub service_name: String,
}

pub type AppContactHandler = ContactHandler<Arc<dyn ContactRepository>, Arc<dyn Mailer>>;

impl AppState {
    pub fn new(
        config: &settings::AppConfig,
        pool: sqlx::PgPool,
        redis_pool: Option<RedisPool>,
    ) -> Result<Self, MailError> {
        let contact_repo: Arc<dyn ContactRepository> = Arc::new(SqlxContactRepo::new(pool));
        let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(config)?);

        Self::from_parts(config, contact_repo, mailer, redis_pool)
    }

    /// Assembles state from already-built collaborators.
    pub fn from_parts(
        config: &settings::AppConfig,
        contact_repo: Arc<dyn ContactRepository>,
        mailer: Arc<dyn Mailer>,
        redis_pool: Option<RedisPool>,
    ) -> Result<Self, MailError> {
        let email_service = EmailService::new(mailer, config)?;
        let contact_handler = ContactHandler::new(contact_repo, email_service, config.duplicate_window());

        Ok(AppState {
            contact_handler,
            redis_pool,
            admin_api_key: config.admin_api_key.clone().map(Zeroizing::new),
            trust_x_forwarded_for: config.trust_x_forwarded_for,
            service_name: config.name.clone(),
        })
    }
}

/// Limiter for the submit route, backed by Redis when a pool is given.
pub fn build_contact_rate_limiter(config: &settings::AppConfig, redis_pool: Option<RedisPool>) -> RateLimiter {
    RateLimiter::new(
        CONTACT_RATE_LIMIT_PREFIX,
        config.rate_limit_max,
        config.rate_limit_window(),
        redis_pool,
    )
}
