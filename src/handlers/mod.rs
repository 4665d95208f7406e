//! HTTP handlers. Each module maps requests onto `DropzoneService`.

pub mod content_handlers;
pub mod dropzone_handlers;
pub mod health_handlers;
pub mod page;
