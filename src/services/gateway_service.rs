//! GatewayService — the two request pipelines, ingest and list.
//!
//! Both are stateless: validate, build a key or prefix, make exactly one
//! backend call, shape the result. Backend errors are logged here with their
//! detail and collapsed into the caller-facing `GatewayError`.

use crate::{
    errors::GatewayError,
    models::{
        library::{IngestReceipt, Library, LibraryEntry},
        object::AccessPolicy,
    },
    services::{
        backend::{BackendResult, ObjectBody, ObjectLister, Uploader},
        key_policy,
        url_policy::UrlPolicy,
    },
};
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

/// One inbound upload. The body is dropped on every exit path of `ingest`.
pub struct UploadRequest {
    pub folder: String,
    pub filename: String,
    pub content_type: String,
    pub body: ObjectBody,
}

#[derive(Clone)]
pub struct GatewayService {
    uploader: Arc<dyn Uploader>,
    lister: Arc<dyn ObjectLister>,
    urls: UrlPolicy,
    access: AccessPolicy,
    list_limit: usize,
}

impl GatewayService {
    pub fn new(
        uploader: Arc<dyn Uploader>,
        lister: Arc<dyn ObjectLister>,
        urls: UrlPolicy,
        access: AccessPolicy,
        list_limit: usize,
    ) -> Self {
        Self {
            uploader,
            lister,
            urls,
            access,
            list_limit: list_limit.max(1),
        }
    }

    /// Store one file under `<folder>/<filename>`, keeping only the last path
    /// component of the client's filename.
    pub async fn ingest(&self, request: UploadRequest) -> Result<IngestReceipt, GatewayError> {
        let UploadRequest {
            folder,
            filename,
            content_type,
            body,
        } = request;

        let folder = key_policy::normalize_folder(&folder)?;
        let filename = key_policy::file_base_name(&filename)?.to_string();
        let key = key_policy::build_key(&folder, &filename)?;

        let span = info_span!("ingest", upload_id = %Uuid::new_v4(), key = %key);
        let ack = self
            .uploader
            .store(&key, body, &content_type, self.access)
            .instrument(span)
            .await
            .map_err(|err| {
                error!(key = %key, "{}", err);
                GatewayError::StoreFailed
            })?;

        info!(
            key = %ack.key,
            etag = ack.etag.as_deref().unwrap_or(""),
            size_bytes = ack.size_bytes,
            access = self.access.as_str(),
            "stored object"
        );

        Ok(IngestReceipt {
            url: self.urls.object_url(&ack.key),
            name: filename,
        })
    }

    /// Enumerate everything under `users/<owner_id>/`.
    pub async fn list(&self, owner_id: &str) -> Result<Library, GatewayError> {
        let prefix = key_policy::build_list_prefix(owner_id)?;

        let keys = self
            .lister
            .list_by_prefix(&prefix, self.list_limit)
            .await
            .map_err(|err| {
                error!(prefix = %prefix, "{}", err);
                GatewayError::ListFailed
            })?;

        let books = keys
            .into_iter()
            .map(|key| {
                let entry = LibraryEntry {
                    url: self.urls.object_url(&key),
                    thumbnail: self.urls.thumbnail_url(&key),
                    name: key,
                };
                debug!(url = %entry.url, thumbnail = %entry.thumbnail, "library entry");
                entry
            })
            .collect::<Vec<_>>();

        info!(owner = owner_id, count = books.len(), "listed library");
        Ok(Library { books })
    }

    /// Ask the backend for a single key; any answer means it is reachable.
    pub async fn check_backend(&self) -> BackendResult<()> {
        self.lister.list_by_prefix("users/", 1).await.map(|_| ())
    }
}
