use actix_cors::Cors;
use actix_web::dev::Service;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use fraud_service::{config::Config, handlers, metrics, AppState};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    info!("Starting Fraud Service...");

    // Load configuration
    let config = Config::from_env().context("failed to load configuration")?;
    info!("Configuration loaded successfully");

    metrics::register_metrics(&metrics::REGISTRY).context("failed to register metrics")?;

    // Initialize components
    let state = web::Data::new(
        AppState::from_config(&config).context("failed to initialize scoring components")?,
    );
    info!(
        "Scorer initialized (model: {}, velocity window: {}m, lookup timeout: {}ms)",
        config.scoring.model_version,
        config.scoring.velocity_window_minutes,
        config.scoring.lookup_timeout_ms
    );

    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let path = req.match_pattern().unwrap_or_else(|| req.path().to_string());
                let started = Instant::now();
                let fut = srv.call(req);
                async move {
                    let res = fut.await?;
                    metrics::observe_http(&method, &path, res.status().as_u16(), started.elapsed());
                    Ok(res)
                }
            })
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await?;

    Ok(())
}
