//! `coinstake-token` — the fungible-asset collaborator, at its interface.
//!
//! The staking ledger never owns token balances itself; it instructs an
//! external token service to move funds. This crate defines that seam
//! ([`TokenService`]) and ships an in-memory implementation for tests and
//! single-process deployments.

pub mod in_memory;
pub mod service;

pub use in_memory::InMemoryToken;
pub use service::{TokenError, TokenService};
