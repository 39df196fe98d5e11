//! Represents an object (file) addressed inside the gateway's bucket.

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Key of a single object within the bucket.
///
/// Keys written by the gateway are always `<folder>/<filename>` with exactly
/// one separator between the two; see `services::key_policy`. Keys read back
/// from a listing are taken as the backend reports them.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct StoredObjectKey(String);

impl StoredObjectKey {
    /// Only `key_policy` and backend listings construct keys.
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoredObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canned access policy attached to a stored object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum AccessPolicy {
    /// Anyone holding the object URL may read it.
    #[default]
    PublicRead,
    /// Only bucket credentials may read it.
    Private,
}

impl AccessPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPolicy::PublicRead => "public-read",
            AccessPolicy::Private => "private",
        }
    }
}

/// Acknowledgment of a completed store.
///
/// Backend-specific responses are narrowed to this shape before they leave
/// the adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadAck {
    /// Resolved key the bytes were written under.
    pub key: StoredObjectKey,

    /// Opaque integrity token (entity tag) reported by the backend, if any.
    pub etag: Option<String>,

    /// Number of bytes consumed from the input stream.
    pub size_bytes: u64,
}
