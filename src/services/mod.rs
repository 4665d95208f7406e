pub mod content_store;
pub mod dropzone_service;
pub mod metadata_store;
