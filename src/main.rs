mod aggregate;
mod config;
mod error;
mod fetch;
mod models;
mod pdf;
mod routes;
mod standards;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{AppConfig, TemplateLocation};
use crate::fetch::HttpFetcher;
use crate::models::PublicUrlResolver;
use crate::pdf::{DirTemplates, HttpTemplates, ImageEmbedder, TemplateSource};
use crate::routes::AppState;
use crate::standards::SchemaRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env()?;
    let registry = SchemaRegistry::builtin().context("loading assessment schema")?;
    let fetcher = HttpFetcher::new(config.fetch_timeout, config.fetch_retries)?;

    let templates: Arc<dyn TemplateSource> = match &config.templates {
        TemplateLocation::Dir(root) => {
            tracing::info!(root = %root.display(), "Serving borang templates from disk");
            Arc::new(DirTemplates::new(root.clone()))
        }
        TemplateLocation::Http(base) => {
            tracing::info!(%base, "Fetching borang templates over HTTP");
            Arc::new(HttpTemplates::new(base.clone(), fetcher.clone()))
        }
    };
    if config.storage_public_url.is_none() {
        tracing::warn!("STORAGE_PUBLIC_URL not set; images without a public_url will be skipped");
    }

    let state = AppState {
        registry: Arc::new(registry),
        templates,
        images: Arc::new(ImageEmbedder::new(fetcher)),
        resolver: config.storage_public_url.as_deref().map(PublicUrlResolver::new),
    };

    let app = routes::router(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {}", addr))?;
    tracing::info!(%addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
