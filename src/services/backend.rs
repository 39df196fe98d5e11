//! Capability traits between the gateway and a storage backend.
//!
//! `GatewayService` only ever sees these two traits. Concrete adapters live in
//! `s3_backend` (production) and `memory_backend` (local runs and tests).

use crate::models::object::{AccessPolicy, StoredObjectKey, UploadAck};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::io;
use thiserror::Error;

/// Body of an upload, consumed exactly once by `Uploader::store`.
pub type ObjectBody = BoxStream<'static, io::Result<Bytes>>;

/// Backend failure with diagnostic detail meant for logs only.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("store failed: {0}")]
    Store(String),
    #[error("list failed: {0}")]
    List(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Write path: persist one object.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Read `body` to the end and store it at `key`, creating or overwriting
    /// exactly one object. A failed store must not leave a readable object
    /// behind under `key`.
    async fn store(
        &self,
        key: &StoredObjectKey,
        body: ObjectBody,
        content_type: &str,
        access: AccessPolicy,
    ) -> BackendResult<UploadAck>;
}

/// Read path: enumerate keys sharing a prefix.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    /// Return at most `limit` keys starting with `prefix`, in backend order.
    async fn list_by_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> BackendResult<Vec<StoredObjectKey>>;
}
