//! In-process backend keeping objects in a sorted map.
//!
//! Used for local runs (`--backend memory`) and as the substitute backend in
//! tests. Listing order is lexicographic by key, like S3.

use crate::{
    models::object::{AccessPolicy, StoredObjectKey, UploadAck},
    services::backend::{BackendError, BackendResult, ObjectBody, ObjectLister, Uploader},
};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use md5::Context;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::debug;

/// A stored payload and the metadata it was written with.
#[derive(Clone, Debug)]
pub struct MemoryObject {
    pub data: Bytes,
    pub content_type: String,
    pub access: AccessPolicy,
    pub etag: String,
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    objects: Arc<RwLock<BTreeMap<String, MemoryObject>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn get(&self, key: &str) -> Option<MemoryObject> {
        self.objects.read().await.get(key).cloned()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl Uploader for MemoryBackend {
    /// Buffers the whole body before touching the map, so a stream error
    /// leaves any previous object at `key` untouched.
    async fn store(
        &self,
        key: &StoredObjectKey,
        mut body: ObjectBody,
        content_type: &str,
        access: AccessPolicy,
    ) -> BackendResult<UploadAck> {
        let mut buf = BytesMut::new();
        let mut digest = Context::new();
        while let Some(chunk_res) = body.next().await {
            let chunk = chunk_res.map_err(|err| BackendError::Store(err.to_string()))?;
            digest.consume(&chunk);
            buf.extend_from_slice(&chunk);
        }
        drop(body);

        let etag = format!("{:x}", digest.compute());
        let size_bytes = buf.len() as u64;
        let object = MemoryObject {
            data: buf.freeze(),
            content_type: content_type.to_string(),
            access,
            etag: etag.clone(),
        };

        debug!(
            key = %key,
            size_bytes = object.data.len(),
            content_type = %object.content_type,
            access = object.access.as_str(),
            etag = %object.etag,
            "stored object in memory"
        );
        self.objects
            .write()
            .await
            .insert(key.as_str().to_string(), object);

        Ok(UploadAck {
            key: key.clone(),
            etag: Some(etag),
            size_bytes,
        })
    }
}

#[async_trait]
impl ObjectLister for MemoryBackend {
    async fn list_by_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> BackendResult<Vec<StoredObjectKey>> {
        let objects = self.objects.read().await;
        let keys = objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .take(limit)
            .map(|(key, _)| StoredObjectKey::new(key.as_str()))
            .collect();
        Ok(keys)
    }
}
