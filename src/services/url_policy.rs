//! Public URL derivation for stored objects.

use crate::models::object::StoredObjectKey;

const THUMBNAIL_ROOT: &str = "thumbnails/";
const THUMBNAIL_SUFFIX: &str = ".jpg";

/// Derives public URLs from keys. Pure string work, no network calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlPolicy {
    /// Namespace root, always ending in exactly one `/`.
    base_url: String,
}

impl UrlPolicy {
    /// Virtual-hosted S3 root for `bucket`: `https://{bucket}.s3.amazonaws.com/`.
    pub fn for_bucket(bucket: &str) -> Self {
        Self::with_base_url(&format!("https://{}.s3.amazonaws.com", bucket))
    }

    /// Use an explicit public root (CDN, S3-compatible endpoint, ...).
    pub fn with_base_url(base_url: &str) -> Self {
        let mut base_url = base_url.trim_end_matches('/').to_string();
        base_url.push('/');
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn object_url(&self, key: &StoredObjectKey) -> String {
        format!("{}{}", self.base_url, key)
    }

    /// URL where a rendered thumbnail for `key` is expected to live.
    pub fn thumbnail_url(&self, key: &StoredObjectKey) -> String {
        format!(
            "{}{}{}{}",
            self.base_url, THUMBNAIL_ROOT, key, THUMBNAIL_SUFFIX
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> StoredObjectKey {
        StoredObjectKey::new(s)
    }

    #[test]
    fn bucket_root_is_virtual_hosted() {
        let urls = UrlPolicy::for_bucket("books-uploaded");
        assert_eq!(urls.base_url(), "https://books-uploaded.s3.amazonaws.com/");
        assert_eq!(
            urls.object_url(&key("users/42/book.pdf")),
            "https://books-uploaded.s3.amazonaws.com/users/42/book.pdf"
        );
    }

    #[test]
    fn thumbnail_sits_under_thumbnails_root() {
        let urls = UrlPolicy::for_bucket("books-uploaded");
        assert_eq!(
            urls.thumbnail_url(&key("users/42/book.pdf")),
            "https://books-uploaded.s3.amazonaws.com/thumbnails/users/42/book.pdf.jpg"
        );
    }

    #[test]
    fn explicit_base_gets_single_trailing_slash() {
        let plain = UrlPolicy::with_base_url("https://cdn.example");
        let slashed = UrlPolicy::with_base_url("https://cdn.example//");
        assert_eq!(plain, slashed);
        assert_eq!(
            plain.object_url(&key("a/b.pdf")),
            "https://cdn.example/a/b.pdf"
        );
    }

    #[test]
    fn urls_are_deterministic() {
        let urls = UrlPolicy::for_bucket("b");
        let k = key("users/7/x.pdf");
        assert_eq!(urls.object_url(&k), urls.object_url(&k));
        assert_eq!(urls.thumbnail_url(&k), urls.thumbnail_url(&k));
    }
}
