//! Key construction rules.
//!
//! Ownership is a prefix convention: every object belonging to owner `X` lives
//! under `users/X/`. There is no separate ownership index, so listings are
//! only as accurate as the writers that follow this layout.

use crate::{errors::GatewayError, models::object::StoredObjectKey};

pub const SEPARATOR: char = '/';
const OWNER_ROOT: &str = "users/";

/// Normalize a folder so it ends with exactly one separator.
///
/// A folder made only of separators is treated as missing, otherwise the
/// resulting key would start at the bucket root with a leading `/`.
pub fn normalize_folder(folder: &str) -> Result<String, GatewayError> {
    let trimmed = folder.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Err(GatewayError::MissingFolder);
    }
    let mut normalized = String::with_capacity(trimmed.len() + 1);
    normalized.push_str(trimmed);
    normalized.push(SEPARATOR);
    Ok(normalized)
}

/// Final path component of a client-supplied filename.
///
/// Both `/` and `\` count as separators. A name that reduces to nothing, `.`
/// or `..` is treated as missing.
pub fn file_base_name(filename: &str) -> Result<&str, GatewayError> {
    let base = filename
        .rsplit(|c: char| c == SEPARATOR || c == '\\')
        .next()
        .unwrap_or_default();
    match base {
        "" | "." | ".." => Err(GatewayError::MissingFile),
        base => Ok(base),
    }
}

/// Build the storage key for `filename` inside `folder`.
pub fn build_key(folder: &str, filename: &str) -> Result<StoredObjectKey, GatewayError> {
    let mut key = normalize_folder(folder)?;
    if filename.is_empty() {
        return Err(GatewayError::MissingFile);
    }
    key.push_str(filename);
    Ok(StoredObjectKey::new(key))
}

/// Prefix selecting every object owned by `owner_id`.
pub fn build_list_prefix(owner_id: &str) -> Result<String, GatewayError> {
    if owner_id.is_empty() {
        return Err(GatewayError::MissingOwner);
    }
    Ok(format!("{OWNER_ROOT}{owner_id}{SEPARATOR}"))
}
