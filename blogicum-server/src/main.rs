use dotenvy::dotenv;
use std::sync::Arc;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;

#[cfg(test)]
mod test_support;

use infrastructure::{
    config::AppConfig,
    database::open_repositories,
    jwt::JwtService,
    logging::init_logging,
    storage::LocalImageStorage,
};
use presentation::Services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    init_logging();

    let config = AppConfig::from_env()?;

    tracing::info!("Starting Blogicum server...");
    tracing::info!("HTTP server will listen on {}", config.http_addr());
    tracing::info!("Media root: {}", config.media_root.display());

    let repos = open_repositories(&config).await?;

    tracing::info!("Initializing services...");
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret)?);
    let images = Arc::new(LocalImageStorage::new(config.media_root.clone()));
    let services = Services::build(&repos, jwt_service, images);
    tracing::info!("Services initialized successfully");

    run_http_server(config, services).await?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// CORS policy for the comma-separated origin list from the config.
fn configure_cors(allowed_origins: &str) -> actix_cors::Cors {
    use actix_cors::Cors;
    use actix_web::http::header;

    allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .fold(
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                ])
                .expose_headers(vec![header::LOCATION])
                .max_age(3600),
            |cors, origin| {
                tracing::debug!("Added allowed CORS origin: {}", origin);
                cors.allowed_origin(origin)
            },
        )
}

async fn run_http_server(config: AppConfig, services: Services) -> anyhow::Result<()> {
    use actix_web::{middleware::Logger, App, HttpServer};

    tracing::info!(
        "Configuring CORS with allowed origins: {}",
        config.cors_allowed_origins
    );

    let cors_allowed_origins = config.cors_allowed_origins.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(configure_cors(&cors_allowed_origins))
            .configure(|cfg| services.configure(cfg))
    })
    .bind(config.http_addr())?
    .run()
    .await?;

    Ok(())
}
