//! Service layer containing the client logic and side-effect helpers.
//!
//! ## Service map
//! - `invoke.rs` — subprocess runner, argument-list helpers, error type.
//! - `cluster.rs` — the cluster client: queries, fees, tx build/sign/submit,
//!   key generation, addresses, genesis sends, governance proposals.
//! - `doctor.rs` — state-dir preflight report.
//! - `audit.rs` — append-only audit log for mutating operations.
//! - `output.rs` — JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod audit;
pub mod cluster;
pub mod doctor;
pub mod invoke;
pub mod output;
