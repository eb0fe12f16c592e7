use actix_web::web;

use crate::{
    handlers::contact,
    limiter::rate_limiter::RateLimiter,
    middlewares::rate_limit::RateLimitMiddleware,
};

pub fn config_routes(cfg: &mut web::ServiceConfig, limiter: RateLimiter, trust_x_forwarded_for: bool) {
    cfg.service(
        web::scope("/contact")
            .service(
                web::resource("/submit")
                    .wrap(RateLimitMiddleware::new(limiter, trust_x_forwarded_for))
                    .route(web::post().to(contact::submit_contact))
            )
            .service(
                web::resource("/stats")
                    .route(web::get().to(contact::get_contact_stats))
            )
            .service(
                web::resource("/all")
                    .route(web::get().to(contact::get_all_contacts))
            )
    );
}
