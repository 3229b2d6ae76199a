use actix_web::{middleware, web, App, HttpServer};
use anyhow::Result;
use fradma_dashboard::api::{configure_routes, ApiState};
use fradma_dashboard::core::AppConfig;
use fradma_dashboard::telemetry::{init_tracing, registrar_metricas};
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration (también lee .env)
    let config = AppConfig::from_env()?;

    // Initialize logging
    init_tracing(&config.log_level);

    tracing::info!("Starting Fradma dashboard API");

    // Initialize Prometheus metrics
    registrar_metricas(prometheus::default_registry())?;

    let host = config.host.clone();
    let port = config.port;
    let max_upload = config.max_upload_size_bytes;

    // Initialize application state
    let state = web::Data::new(ApiState::new(config)?);

    tracing::info!("Starting server on {}:{}", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_upload))
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
