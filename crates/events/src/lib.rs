//! `coinstake-events` — observable domain events.
//!
//! The ledger's mutations surface as an append-only stream of events that
//! external indexers consume. This crate holds the domain-agnostic pieces:
//! the [`Event`] trait and an in-memory append-only [`EventLog`].

pub mod event;
pub mod log;

pub use event::Event;
pub use log::{EventLog, EventLogError};
