use anyhow::Result;
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use config::{AppConfig, BackendKind};
use services::{
    backend::{ObjectLister, Uploader},
    gateway_service::GatewayService,
    memory_backend::MemoryBackend,
    s3_backend::S3Backend,
    url_policy::UrlPolicy,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Environment file (optional) ---
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => tracing::debug!("No .env file found"),
        Err(err) => return Err(err.into()),
    }

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting object-gateway with config: {:?}", cfg);

    // --- Storage backend ---
    let (uploader, lister): (Arc<dyn Uploader>, Arc<dyn ObjectLister>) = match cfg.backend {
        BackendKind::S3 => {
            let backend = Arc::new(
                S3Backend::connect(
                    cfg.bucket.clone(),
                    cfg.region.clone(),
                    cfg.endpoint_url.clone(),
                )
                .await,
            );
            (backend.clone() as Arc<dyn Uploader>, backend as Arc<dyn ObjectLister>)
        }
        BackendKind::Memory => {
            tracing::warn!("Using in-memory backend; uploads are lost on exit");
            let backend = Arc::new(MemoryBackend::new());
            (backend.clone() as Arc<dyn Uploader>, backend as Arc<dyn ObjectLister>)
        }
    };

    let urls = match cfg.public_base_url.as_deref() {
        Some(base) => UrlPolicy::with_base_url(base),
        None => UrlPolicy::for_bucket(&cfg.bucket),
    };
    tracing::info!("Public object root: {}", urls.base_url());

    // --- Initialize core service ---
    let gateway = GatewayService::new(uploader, lister, urls, cfg.acl, cfg.list_limit);

    // --- Build router ---
    let app: Router = routes::routes::routes(cfg.max_upload_bytes).with_state(gateway);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
