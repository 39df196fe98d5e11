//! Defines the gateway's HTTP surface.
//!
//! ## Structure
//! - `POST /upload`  — multipart ingest (`pdf` file part, `s3_path` folder part)
//! - `GET  /library` — list an owner's objects (`?userId=`)
//! - `GET  /healthz` — liveness
//! - `GET  /readyz`  — readiness (backend reachable)
//!
//! CORS is fully permissive; browsers upload directly from the reader app.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        library_handlers::show_library,
        upload_handlers::upload_file,
    },
    services::gateway_service::GatewayService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the router; it carries `GatewayService` as shared state.
pub fn routes(max_upload_bytes: usize) -> Router<GatewayService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/upload", post(upload_file))
        .route("/library", get(show_library))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
