pub mod health_handlers;
pub mod library_handlers;
pub mod upload_handlers;
