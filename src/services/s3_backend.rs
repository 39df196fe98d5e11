//! Amazon S3 (and S3-compatible) backend.

use crate::{
    models::object::{AccessPolicy, StoredObjectKey, UploadAck},
    services::backend::{BackendError, BackendResult, ObjectBody, ObjectLister, Uploader},
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, meta::region::RegionProviderChain};
use aws_sdk_s3::{
    Client,
    error::DisplayErrorContext,
    primitives::ByteStream,
    types::ObjectCannedAcl,
};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::time::Instant;
use tracing::{error, info, warn};

/// S3 caps a single ListObjectsV2 page at 1000 keys.
const MAX_PAGE_KEYS: usize = 1000;

#[derive(Clone)]
pub struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    /// Build a client from the default AWS provider chain.
    ///
    /// `region` overrides the chain's region. `endpoint_url` points the client
    /// at an S3-compatible service and switches to path-style addressing.
    pub async fn connect(
        bucket: String,
        region: Option<String>,
        endpoint_url: Option<String>,
    ) -> Self {
        let region_provider =
            RegionProviderChain::first_try(region.map(aws_config::Region::new))
                .or_default_provider();
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let client = match endpoint_url {
            Some(endpoint) => {
                let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                    .endpoint_url(endpoint)
                    .force_path_style(true)
                    .build();
                Client::from_conf(s3_config)
            }
            None => Client::new(&sdk_config),
        };

        Self::new(client, bucket)
    }

    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

fn canned_acl(access: AccessPolicy) -> ObjectCannedAcl {
    match access {
        AccessPolicy::PublicRead => ObjectCannedAcl::PublicRead,
        AccessPolicy::Private => ObjectCannedAcl::Private,
    }
}

/// S3 returns entity tags wrapped in double quotes.
fn strip_etag_quotes(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

/// Join buffered body chunks. A single chunk is handed back as-is.
fn join_chunks(chunks: Vec<Bytes>) -> Bytes {
    if let [only] = chunks.as_slice() {
        return only.clone();
    }
    let total = chunks.iter().map(Bytes::len).sum();
    let mut buf = BytesMut::with_capacity(total);
    for chunk in &chunks {
        buf.extend_from_slice(chunk);
    }
    buf.freeze()
}

/// One ListObjectsV2 page.
struct KeyPage {
    keys: Vec<String>,
    /// Set only when the backend reports more keys after this page.
    next_token: Option<String>,
}

struct CollectedKeys {
    keys: Vec<StoredObjectKey>,
    /// More keys existed past `limit`.
    truncated: bool,
}

/// Drive `fetch(page_size, continuation_token)` until the listing ends or
/// `limit` keys are collected. Never asks for more than the keys still needed.
async fn collect_pages<F, Fut>(limit: usize, mut fetch: F) -> BackendResult<CollectedKeys>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: Future<Output = BackendResult<KeyPage>>,
{
    let mut keys: Vec<StoredObjectKey> = Vec::new();
    let mut token: Option<String> = None;

    while keys.len() < limit {
        let page_size = (limit - keys.len()).min(MAX_PAGE_KEYS);
        let page = fetch(page_size, token.take()).await?;
        keys.extend(page.keys.into_iter().map(StoredObjectKey::new));
        token = page.next_token;
        if token.is_none() {
            break;
        }
    }

    let truncated = token.is_some() || keys.len() > limit;
    keys.truncate(limit);
    Ok(CollectedKeys { keys, truncated })
}

#[async_trait]
impl Uploader for S3Backend {
    /// Single PutObject: S3 never exposes a partially written object.
    async fn store(
        &self,
        key: &StoredObjectKey,
        mut body: ObjectBody,
        content_type: &str,
        access: AccessPolicy,
    ) -> BackendResult<UploadAck> {
        let start = Instant::now();

        let mut chunks = Vec::new();
        while let Some(chunk_res) = body.next().await {
            chunks.push(chunk_res.map_err(|err| BackendError::Store(err.to_string()))?);
        }
        drop(body);
        let data = join_chunks(chunks);
        let size_bytes = data.len() as u64;

        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(ByteStream::from(data))
            .content_type(content_type)
            .acl(canned_acl(access))
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                BackendError::Store(e.to_string())
            })?;

        info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(UploadAck {
            key: key.clone(),
            etag: output.e_tag().map(strip_etag_quotes),
            size_bytes,
        })
    }
}

#[async_trait]
impl ObjectLister for S3Backend {
    /// Follows continuation tokens until the listing ends or `limit` keys
    /// have been collected.
    async fn list_by_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> BackendResult<Vec<StoredObjectKey>> {
        let client = &self.client;
        let bucket = self.bucket.as_str();

        let collected = collect_pages(limit, |page_size, token| async move {
            let output = client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .max_keys(page_size as i32)
                .set_continuation_token(token)
                .send()
                .await
                .map_err(|e| {
                    error!(
                        error = %DisplayErrorContext(&e),
                        bucket,
                        prefix,
                        "S3 list failed"
                    );
                    BackendError::List(e.to_string())
                })?;

            let next_token = if output.is_truncated().unwrap_or(false) {
                output.next_continuation_token().map(str::to_string)
            } else {
                None
            };
            Ok::<_, BackendError>(KeyPage {
                keys: output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(str::to_string)
                    .collect(),
                next_token,
            })
        })
        .await?;

        if collected.truncated {
            warn!(bucket, prefix, limit, "listing truncated at configured limit");
        }
        Ok(collected.keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::ready;
    use std::collections::VecDeque;

    fn page(keys: &[&str], next_token: Option<&str>) -> BackendResult<KeyPage> {
        Ok(KeyPage {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            next_token: next_token.map(str::to_string),
        })
    }

    /// Replays `pages` in order and records every (page_size, token) request.
    async fn replay(
        limit: usize,
        pages: Vec<BackendResult<KeyPage>>,
    ) -> (BackendResult<CollectedKeys>, Vec<(usize, Option<String>)>) {
        let mut pages = VecDeque::from(pages);
        let mut requests = Vec::new();
        let result = collect_pages(limit, |page_size, token| {
            requests.push((page_size, token));
            ready(pages.pop_front().unwrap_or_else(|| page(&[], None)))
        })
        .await;
        (result, requests)
    }

    fn names(collected: &CollectedKeys) -> Vec<&str> {
        collected.keys.iter().map(|k| k.as_str()).collect()
    }

    #[test]
    fn etag_quotes_are_removed() {
        assert_eq!(strip_etag_quotes("\"abc123\""), "abc123");
        assert_eq!(strip_etag_quotes("abc123"), "abc123");
    }

    #[test]
    fn access_policy_maps_to_canned_acl() {
        assert_eq!(canned_acl(AccessPolicy::PublicRead), ObjectCannedAcl::PublicRead);
        assert_eq!(canned_acl(AccessPolicy::Private), ObjectCannedAcl::Private);
    }

    #[test]
    fn single_chunk_is_not_copied() {
        let chunk = Bytes::from(vec![7u8; 64]);
        let joined = join_chunks(vec![chunk.clone()]);
        assert_eq!(joined.as_ptr(), chunk.as_ptr());
        assert_eq!(joined.len(), 64);
    }

    #[test]
    fn several_chunks_are_joined_in_order() {
        let joined = join_chunks(vec![
            Bytes::from_static(b"%PDF"),
            Bytes::from_static(b"-1.7 "),
            Bytes::from_static(b"body"),
        ]);
        assert_eq!(&joined[..], b"%PDF-1.7 body");
        assert!(join_chunks(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn follows_tokens_across_pages() {
        let (result, requests) = replay(
            10,
            vec![
                page(&["u/1/a", "u/1/b"], Some("t1")),
                page(&["u/1/c", "u/1/d"], Some("t2")),
                page(&["u/1/e"], None),
            ],
        )
        .await;

        let collected = result.unwrap();
        assert_eq!(names(&collected), vec!["u/1/a", "u/1/b", "u/1/c", "u/1/d", "u/1/e"]);
        assert!(!collected.truncated);
        assert_eq!(
            requests,
            vec![
                (10, None),
                (8, Some("t1".to_string())),
                (6, Some("t2".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn limit_reached_mid_page_truncates() {
        let (result, requests) = replay(
            3,
            vec![
                page(&["a", "b"], Some("t1")),
                // A backend may return more than the requested page size.
                page(&["c", "d"], Some("t2")),
            ],
        )
        .await;

        let collected = result.unwrap();
        assert_eq!(names(&collected), vec!["a", "b", "c"]);
        assert!(collected.truncated);
        assert_eq!(requests, vec![(3, None), (1, Some("t1".to_string()))]);
    }

    #[tokio::test]
    async fn last_page_exactly_filling_limit_is_complete() {
        let (result, requests) = replay(
            3,
            vec![page(&["a", "b"], Some("t1")), page(&["c"], None)],
        )
        .await;

        let collected = result.unwrap();
        assert_eq!(names(&collected), vec!["a", "b", "c"]);
        assert!(!collected.truncated);
        assert_eq!(requests.len(), 2);
    }

    #[tokio::test]
    async fn full_page_with_more_keys_stops_without_another_request() {
        let (result, requests) = replay(
            2,
            vec![page(&["a", "b"], Some("t1")), page(&["c"], None)],
        )
        .await;

        let collected = result.unwrap();
        assert_eq!(names(&collected), vec!["a", "b"]);
        assert!(collected.truncated);
        assert_eq!(requests, vec![(2, None)]);
    }

    #[tokio::test]
    async fn page_size_never_exceeds_s3_maximum() {
        let (result, requests) = replay(
            2500,
            vec![page(&["a"], Some("t1")), page(&["b"], None)],
        )
        .await;

        assert_eq!(result.unwrap().keys.len(), 2);
        assert_eq!(requests[0].0, MAX_PAGE_KEYS);
        assert_eq!(requests[1].0, MAX_PAGE_KEYS);
    }

    #[tokio::test]
    async fn zero_limit_makes_no_request() {
        let (result, requests) = replay(0, vec![page(&["a"], None)]).await;
        assert!(result.unwrap().keys.is_empty());
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn page_error_is_returned() {
        let (result, requests) = replay(
            10,
            vec![
                page(&["a"], Some("t1")),
                Err(BackendError::List("SlowDown".into())),
            ],
        )
        .await;

        assert!(matches!(result, Err(BackendError::List(msg)) if msg == "SlowDown"));
        assert_eq!(requests.len(), 2);
    }
}
