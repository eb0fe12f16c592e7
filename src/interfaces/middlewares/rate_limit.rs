use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
    Error, ResponseError,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{
    errors::AppError,
    limiter::rate_limiter::{RateLimitDecision, RateLimiter},
    utils::get_client_ip::get_service_client_ip,
};

/// Per-IP fixed-window limit for the wrapped routes.
///
/// Every hit counts, including rejected ones. Responses carry the
/// `RateLimit-*` standard headers; rejections add `Retry-After`.
pub struct RateLimitMiddleware {
    limiter: RateLimiter,
    trust_x_forwarded_for: bool,
}

impl RateLimitMiddleware {
    pub fn new(limiter: RateLimiter, trust_x_forwarded_for: bool) -> Self {
        RateLimitMiddleware { limiter, trust_x_forwarded_for }
    }
}

impl<S> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            trust_x_forwarded_for: self.trust_x_forwarded_for,
        })
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: RateLimiter,
    trust_x_forwarded_for: bool,
}

impl<S> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = self.limiter.clone();
        let trust_x_forwarded_for = self.trust_x_forwarded_for;

        Box::pin(async move {
            // Preflight requests are not submissions
            if req.method() == actix_web::http::Method::OPTIONS {
                return service.call(req).await;
            }

            let client_ip = get_service_client_ip(&req, trust_x_forwarded_for);
            let decision = limiter.check(&client_ip).await;
            let window_secs = limiter.window().as_secs();

            if !decision.allowed {
                tracing::warn!(client_ip = %client_ip, path = %req.path(), "Contact rate limit exceeded");

                let mut response = AppError::RateLimited.error_response();
                insert_rate_limit_headers(response.headers_mut(), &decision, window_secs);
                response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(decision.reset_after));
                return Ok(req.into_response(response));
            }

            let mut res = service.call(req).await?;
            insert_rate_limit_headers(res.headers_mut(), &decision, window_secs);
            Ok(res)
        })
    }
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision, window_secs: u64) {
    let policy = format!("{};w={}", decision.limit, window_secs);
    if let Ok(value) = HeaderValue::from_str(&policy) {
        headers.insert(HeaderName::from_static("ratelimit-policy"), value);
    }
    headers.insert(HeaderName::from_static("ratelimit-limit"), HeaderValue::from(decision.limit));
    headers.insert(HeaderName::from_static("ratelimit-remaining"), HeaderValue::from(decision.remaining));
    headers.insert(HeaderName::from_static("ratelimit-reset"), HeaderValue::from(decision.reset_after));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};
    use std::time::Duration;

    async fn ok_handler() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn rejects_after_limit_with_headers() {
        let limiter = RateLimiter::new("rl:test", 2, Duration::from_secs(900), None);
        let app = test::init_service(
            App::new().service(
                web::resource("/submit")
                    .wrap(RateLimitMiddleware::new(limiter, false))
                    .route(web::post().to(ok_handler))
            )
        ).await;

        let peer = "198.51.100.7:5000".parse().unwrap();
        for remaining in ["1", "0"] {
            let req = test::TestRequest::post().uri("/submit").peer_addr(peer).to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::OK);
            assert_eq!(res.headers().get("ratelimit-remaining").unwrap(), remaining);
            assert_eq!(res.headers().get("ratelimit-policy").unwrap(), "2;w=900");
        }

        let req = test::TestRequest::post().uri("/submit").peer_addr(peer).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(res.headers().contains_key(RETRY_AFTER));

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], crate::errors::RATE_LIMITED_MESSAGE);
    }

    #[actix_web::test]
    async fn separate_clients_have_separate_windows() {
        let limiter = RateLimiter::new("rl:test", 1, Duration::from_secs(900), None);
        let app = test::init_service(
            App::new().service(
                web::resource("/submit")
                    .wrap(RateLimitMiddleware::new(limiter, true))
                    .route(web::post().to(ok_handler))
            )
        ).await;

        for ip in ["203.0.113.1", "203.0.113.2"] {
            let req = test::TestRequest::post()
                .uri("/submit")
                .insert_header(("x-forwarded-for", ip))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::post()
            .uri("/submit")
            .insert_header(("x-forwarded-for", "203.0.113.1"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
