use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use portfolio_contact_api::{
    background_task::start_limiter_eviction_task,
    build_contact_rate_limiter,
    constants::record_start_time,
    cors::build_cors,
    db::{postgres::{create_pool, run_migrations}, redis_pool::create_redis_pool},
    graceful_shutdown::shutdown_signal,
    routes::configure_routes,
    settings::{AppConfig, LogFormat},
    telemetry::init_tracing,
    AppState
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    record_start_time();

    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.effective_log_format());
    tracing::info!("Loaded configuration: {:?}", config);

    let pool = create_pool(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create database connection pool: {}", e);
            std::io::Error::other(e)
        })?;

    run_migrations(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            std::io::Error::other(e)
        })?;

    let redis_pool = config.redis_url.as_deref().and_then(create_redis_pool);

    let app_state = AppState::new(&config, pool, redis_pool.clone())
        .map(web::Data::new)
        .map_err(|e| {
            tracing::error!("Failed to initialise email delivery: {}", e);
            std::io::Error::other(e)
        })?;

    let limiter = build_contact_rate_limiter(&config, redis_pool);
    let server_addr = format!("{}:{}", config.host, config.port);
    let cors_origins = config.cors_origins();
    let trust_x_forwarded_for = config.trust_x_forwarded_for;

    tracing::info!(
        "🚀 Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let eviction_store = limiter.memory_store().clone();

    let server = HttpServer::new(move || {
        let limiter = limiter.clone();
        App::new()
            .app_data(app_state.clone())
            .wrap(NormalizePath::trim())
            .wrap(build_cors(&cors_origins))
            .wrap(TracingLogger::default())
            .configure(|cfg| configure_routes(cfg, limiter, trust_x_forwarded_for))
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    tokio::spawn(start_limiter_eviction_task(eviction_store));

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
