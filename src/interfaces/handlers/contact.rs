use actix_web::{http::header::USER_AGENT, web, HttpRequest, HttpResponse};

use crate::{
    entities::contact::{ClientInfo, ContactForm, DataResponse, ListQuery, SubmitContactResponse},
    errors::AppError,
    use_cases::extractors::AdminAccess,
    utils::get_client_ip::get_client_ip,
    AppState,
};

pub const SUBMIT_SUCCESS_MESSAGE: &str = "Thank you for your message! I will get back to you soon.";

pub async fn submit_contact(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ContactForm>,
) -> Result<HttpResponse, AppError> {
    let client = ClientInfo {
        ip_address: Some(get_client_ip(&req, state.trust_x_forwarded_for)),
        user_agent: req.headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let contact = state.contact_handler
        .submit(form.into_inner(), client)
        .await?;

    Ok(HttpResponse::Ok().json(SubmitContactResponse {
        success: true,
        message: SUBMIT_SUCCESS_MESSAGE.to_string(),
        data: (&contact).into(),
    }))
}

pub async fn get_contact_stats(
    state: web::Data<AppState>,
    _admin: AdminAccess,
) -> Result<HttpResponse, AppError> {
    let data = state.contact_handler
        .stats()
        .await
        .map_err(|e| {
            tracing::error!("Get stats error: {}", e);
            AppError::OperationFailed("Failed to fetch statistics".into())
        })?;

    Ok(HttpResponse::Ok().json(DataResponse::new(data)))
}

pub async fn get_all_contacts(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
    _admin: AdminAccess,
) -> Result<HttpResponse, AppError> {
    let data = state.contact_handler
        .list(&query)
        .await
        .map_err(|e| {
            tracing::error!("Get contacts error: {}", e);
            AppError::OperationFailed("Failed to fetch contacts".into())
        })?;

    Ok(HttpResponse::Ok().json(DataResponse::new(data)))
}
