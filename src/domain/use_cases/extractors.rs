use actix_web::{web, FromRequest, HttpRequest};
use constant_time_eq::constant_time_eq;
use futures_util::future::{ready, Ready};
use sha2::{Digest, Sha256};

use crate::{errors::AppError, AppState};

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Extractor guarding the admin read endpoints.
/// Returns 401 when the key is missing or wrong.
/// Returns 403 when no admin key is configured at all.
/// Usage: Add `_admin: AdminAccess` as a parameter to your handler function.
#[derive(Debug)]
pub struct AdminAccess;

impl FromRequest for AdminAccess {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            tracing::error!("AppState missing in admin extractor");
            return ready(Err(AppError::InternalError("application state missing".into()).into()));
        };

        let Some(expected) = state.admin_api_key.as_ref() else {
            return ready(Err(AppError::ForbiddenAccess("Admin API is disabled".into()).into()));
        };

        match extract_admin_key(req) {
            Some(provided) if keys_match(provided, expected.as_str()) => ready(Ok(AdminAccess)),
            Some(_) => {
                tracing::warn!("Rejected admin request with invalid key");
                ready(Err(AppError::UnauthorizedAccess.into()))
            }
            None => ready(Err(AppError::UnauthorizedAccess.into())),
        }
    }
}

/// Constant-time comparison of the SHA-256 digests of both keys.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    constant_time_eq(provided.as_slice(), expected.as_slice())
}

fn extract_admin_key(req: &HttpRequest) -> Option<&str> {
    let bearer = req.headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| {
            let (scheme, token) = header.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        });

    bearer.or_else(|| {
        req.headers()
            .get(ADMIN_KEY_HEADER)
            .and_then(|header| header.to_str().ok())
            .map(str::trim)
    })
}
