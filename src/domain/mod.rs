//! Shared data model layer (structs only).
//!
//! ## Purpose
//! - Keep DTO/report structs in one place.
//! - Make JSON output schema changes explicit and reviewable.
//!
//! ## Files
//! - `models.rs` — chain query results, key/tx value types, report structs.
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem/subprocess side effects.

pub mod models;
