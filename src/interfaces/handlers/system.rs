use actix_web::{web, get, HttpResponse, Responder};
use redis::AsyncCommands;
use humantime::format_duration;
use once_cell::sync::Lazy;
use chrono::Utc;
use std::{
    time::Duration,
    sync::{atomic::{AtomicI64, Ordering}, RwLock},
};
use sysinfo::System;
use serde::Serialize;
use crate::{constants::{HEALTH_CACHE_SECS, START_TIME}, AppState};

#[derive(Serialize, Clone, Default)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    start_at: String,
    database: String,
    redis_status: String,
    mailer: String,
    version: String,
    memory_usage: String,
}

static LAST_CHECK: AtomicI64 = AtomicI64::new(0);
static CACHED_STATUS: Lazy<RwLock<HealthCheckResponse>> = Lazy::new(||
    RwLock::new(HealthCheckResponse::default())
);

async fn redis_status(state: &AppState) -> &'static str {
    let Some(pool) = &state.redis_pool else {
        return "Not configured";
    };

    match pool.get().await {
        Ok(mut conn) => {
            let result: redis::RedisResult<String> = conn.ping().await;
            match result {
                Ok(pong) if pong == "PONG" => "OK",
                _ => "Unavailable",
            }
        }
        Err(_) => "Unavailable",
    }
}

async fn build_health_response(state: &AppState) -> HealthCheckResponse {
    let now_utc = Utc::now();
    let uptime_secs = now_utc.signed_duration_since(*START_TIME).num_seconds().max(0) as u64;
    let human_uptime = format_duration(Duration::from_secs(uptime_secs));

    let database = match state.contact_handler.check_database().await {
        Ok(_) => "OK",
        Err(e) => {
            tracing::warn!("Health check database probe failed: {}", e);
            "Unavailable"
        }
    };

    let mailer = if state.contact_handler.email_service.is_configured() {
        "Configured"
    } else {
        "Not configured"
    };

    let mut sys = System::new();
    let memory_usage = sysinfo::get_current_pid()
        .ok()
        .and_then(|pid| {
            sys.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);
            sys.process(pid).map(|p| format!("{:.2} MB", p.memory() as f64 / 1024.0 / 1024.0))
        })
        .unwrap_or_else(|| "Unknown".to_string());

    let status = if database == "OK" { "healthy" } else { "degraded" };

    HealthCheckResponse {
        status: status.to_string(),
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        database: database.to_string(),
        redis_status: redis_status(state).await.to_string(),
        mailer: mailer.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        memory_usage,
    }
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now = Utc::now().timestamp();
    let last = LAST_CHECK.load(Ordering::Relaxed);

    if now - last > HEALTH_CACHE_SECS {
        let response = build_health_response(&state).await;

        if let Ok(mut cache) = CACHED_STATUS.write() {
            *cache = response.clone();
            LAST_CHECK.store(now, Ordering::Relaxed);
        }

        HttpResponse::Ok().json(response)
    } else {
        match CACHED_STATUS.read() {
            Ok(response) => HttpResponse::Ok().json(response.clone()),
            Err(e) => {
                tracing::warn!("HealthCheck cache lock poisoned: {}", e);
                let response = build_health_response(&state).await;
                HttpResponse::Ok().json(response)
            }
        }
    }
}
