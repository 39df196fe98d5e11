//! `GET /library?userId=` — list an owner's stored objects.
//!
//! The query string is read as raw pairs so that a repeated `userId` or any
//! other malformed query still answers with the JSON error body. The first
//! `userId` wins.

use crate::{
    errors::{AppError, GatewayError},
    models::library::Library,
    services::gateway_service::GatewayService,
};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use tracing::warn;

const OWNER_PARAM: &str = "userId";

pub async fn show_library(
    State(service): State<GatewayService>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Library>, AppError> {
    let Query(params) = query.map_err(|rejection| {
        warn!("rejected library query: {}", rejection);
        GatewayError::MissingOwner
    })?;

    let owner = first_owner(params);
    let library = service.list(&owner).await?;
    Ok(Json(library))
}

fn first_owner(params: Vec<(String, String)>) -> String {
    params
        .into_iter()
        .find(|(name, _)| name == OWNER_PARAM)
        .map(|(_, value)| value)
        .unwrap_or_default()
}
