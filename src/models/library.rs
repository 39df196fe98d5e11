//! Payloads returned to HTTP callers.

use crate::models::object::StoredObjectKey;
use serde::Serialize;

/// Result of a successful ingest.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct IngestReceipt {
    /// Public URL of the stored object.
    #[serde(rename = "pdf_url")]
    pub url: String,

    /// Filename as supplied by the uploader.
    #[serde(rename = "pdf_name")]
    pub name: String,
}

/// A listed object as shown to the owner.
///
/// Built fresh from a key on every listing. The thumbnail URL follows a
/// naming convention only; nothing checks that the thumbnail exists.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct LibraryEntry {
    pub url: String,
    pub thumbnail: String,
    pub name: StoredObjectKey,
}

/// All objects found under an owner's prefix, in backend order.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Library {
    pub books: Vec<LibraryEntry>,
}
