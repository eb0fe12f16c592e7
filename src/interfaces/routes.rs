use actix_web::web;

use crate::{
    handlers::{home::home, system::health_check},
    limiter::rate_limiter::RateLimiter,
};

mod contact;
mod json_error;

/// Registers every route. The limiter is shared by all workers, so it is
/// built once outside the `HttpServer` factory and passed in.
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiter: RateLimiter, trust_x_forwarded_for: bool) {
    cfg.service(home);
    cfg.service(health_check);

    cfg.service(
        web::scope("/api")
            .configure(|cfg| contact::config_routes(cfg, limiter, trust_x_forwarded_for))
    );

    cfg.configure(json_error::config_routes);
}
