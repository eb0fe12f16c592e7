use actix_web::{
    web,
    error::{JsonPayloadError, QueryPayloadError},
};

use crate::errors::AppError;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(16 * 1024).error_handler(|err, _req| {
        tracing::debug!("Rejected JSON payload: {}", err);
        AppError::from(err).into()
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::from(err).into()
    }));
}

impl From<JsonPayloadError> for AppError {
    fn from(err: JsonPayloadError) -> Self {
        match err {
            JsonPayloadError::ContentType => {
                AppError::BadRequest("Content-Type must be application/json".into())
            }
            JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                AppError::BadRequest("Request body is too large".into())
            }
            _ => AppError::BadRequest(format!("Invalid JSON payload: {}", err)),
        }
    }
}

impl From<QueryPayloadError> for AppError {
    fn from(err: QueryPayloadError) -> Self {
        AppError::BadRequest(format!("Invalid query string: {}", err))
    }
}
