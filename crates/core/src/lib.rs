//! `coinstake-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use id::{Address, DepositId, ParseAddressError, YieldConfigId};
