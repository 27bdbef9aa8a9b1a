//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `query.rs` — doctor and read-only chain queries.
//! - `chain.rs` — keys/addresses/delegation/send/governance.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate the actual work to `services/*`.
//! - Keep behavior and output schema stable.

pub mod chain;
pub mod query;

pub use chain::{
    handle_address_commands, handle_chain_commands, handle_key_commands, handle_stake_commands,
};
pub use query::{handle_doctor_command, handle_query_commands};
