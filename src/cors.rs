use actix_cors::Cors;
use actix_web::http::{header::{self, HeaderName}, Method};

use crate::use_cases::extractors::ADMIN_KEY_HEADER;

/// Response headers a browser client may read: the four rate-limit headers
/// and `Retry-After`.
pub const EXPOSED_HEADERS: [&str; 5] = [
    "ratelimit-policy",
    "ratelimit-limit",
    "ratelimit-remaining",
    "ratelimit-reset",
    "retry-after",
];

pub fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(ADMIN_KEY_HEADER),
        ])
        .expose_headers(EXPOSED_HEADERS.map(HeaderName::from_static))
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors.allow_any_origin()
    } else {
        origins.iter().fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn exposes_every_rate_limit_header() {
        let app = test::init_service(
            App::new()
                .wrap(build_cors(&["https://portfolio.example".to_string()]))
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() }))
        ).await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header(("Origin", "https://portfolio.example"))
            .to_request();
        let res = test::call_service(&app, req).await;

        let exposed = res.headers()
            .get(header::ACCESS_CONTROL_EXPOSE_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_lowercase();
        for name in EXPOSED_HEADERS {
            assert!(exposed.contains(name), "{name} missing from {exposed}");
        }
    }
}
