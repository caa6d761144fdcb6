#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

//! ODIS domain-restricted quota authorization.
//!
//! Clients identify a rate-limited domain by its canonical EIP-712 hash and present
//! an attempt timestamp; this crate decides whether the attempt is authorized and
//! computes the quota state to persist for the next decision.

// Domains and their quota state
//
// - Domain model: a closed set of domain kinds, one today (sequential delay)
// - Canonical hashing: EIP-712 v4 typed data, bit-exact across implementations
// - Rate limiting: pure transition (domain, time, state) -> (decision, state)
//
// Nothing here performs I/O or reads the clock. Callers load the state stored under
// the domain hash, run the limiter, and write the returned state back atomically.

// Core modules
pub mod types;
pub mod errors;
mod optional;
pub mod domain;
pub mod sequential_delay;
pub mod quota;
pub mod presets;
#[cfg(feature = "store")]
pub mod store;

// Re-export commonly used types and functions
pub use types::*;
pub use errors::DomainError;
pub use domain::{
    domain_hash, domain_options_hash, domain_options_typed_data, domain_options_types_for,
    domain_typed_data, domain_types_for, Domain, DomainOptions,
};
pub use sequential_delay::{check_sequential_delay_rate_limit, remaining_quota};
pub use quota::{check_nonce, find_threshold_domain_state};
#[cfg(feature = "store")]
pub use store::{InMemoryStateStore, QuotaService, QuotaStatus, StateStore};
pub use odis_primitives::{eip712::TypedData, Hash256};

// Version constants
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
