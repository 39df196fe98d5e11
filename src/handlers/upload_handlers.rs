//! `POST /upload` — multipart ingest.
//!
//! Expects a `pdf` file part and an `s3_path` text part. The file part is
//! read fully before the service runs, since multipart fields arrive in
//! whatever order the client sent them.

use crate::{
    errors::{AppError, GatewayError},
    models::library::IngestReceipt,
    services::gateway_service::{GatewayService, UploadRequest},
};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use bytes::Bytes;
use futures::{StreamExt, future, stream};
use std::io;
use tracing::warn;

const FILE_FIELD: &str = "pdf";
const FOLDER_FIELD: &str = "s3_path";
const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

struct FilePart {
    filename: String,
    content_type: String,
    data: Bytes,
}

pub async fn upload_file(
    State(service): State<GatewayService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestReceipt>, AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!("rejected upload body: {}", rejection);
        GatewayError::MissingFile
    })?;

    let mut folder = String::new();
    let mut file: Option<FilePart> = None;

    loop {
        let field = multipart.next_field().await.map_err(|err| {
            warn!("malformed multipart body: {}", err);
            GatewayError::MissingFile
        })?;
        let Some(field) = field else { break };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let data = field.bytes().await.map_err(|err| {
                    warn!("could not read file part: {}", err);
                    GatewayError::StreamOpenFailed
                })?;
                file = Some(FilePart {
                    filename,
                    content_type,
                    data,
                });
            }
            Some(FOLDER_FIELD) => {
                folder = field.text().await.map_err(|err| {
                    warn!("could not read {} part: {}", FOLDER_FIELD, err);
                    GatewayError::MissingFolder
                })?;
            }
            _ => {}
        }
    }

    let file = file.ok_or(GatewayError::MissingFile)?;
    let data = file.data;
    let receipt = service
        .ingest(UploadRequest {
            folder,
            filename: file.filename,
            content_type: file.content_type,
            body: stream::once(future::ready(Ok::<_, io::Error>(data))).boxed(),
        })
        .await?;

    Ok(Json(receipt))
}
