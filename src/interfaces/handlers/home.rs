use actix_web::{get, web, HttpResponse, Responder};

use crate::AppState;

#[get("/")]
pub async fn home(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Portfolio contact API is running",
        "service": state.service_name,
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "submit": "POST /api/contact/submit",
            "stats": "GET /api/contact/stats",
            "all": "GET /api/contact/all",
            "health": "GET /health"
        }
    }))
}
