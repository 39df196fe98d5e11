pub mod backend;
pub mod gateway_service;
pub mod key_policy;
pub mod memory_backend;
pub mod s3_backend;
pub mod url_policy;
