//! Core data models for the dropzone service.
//!
//! Records map to the `images` table via `sqlx::FromRow` and serialize
//! as JSON via `serde`.

pub mod file_record;
