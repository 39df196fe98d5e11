//! Data types shared by the gateway service and its HTTP handlers.
//!
//! Nothing here is persisted by the gateway; the storage backend is the only
//! system of record.

pub mod library;
pub mod object;
