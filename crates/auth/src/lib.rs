//! `coinstake-auth` — pure authorization boundary.
//!
//! This crate is intentionally decoupled from transport and storage: role
//! membership lives in an in-memory registry and the policy check itself is a
//! pure function over it.

pub mod authorize;
pub mod registry;
pub mod roles;

pub use authorize::{authorize, AuthzError};
pub use registry::RoleRegistry;
pub use roles::Role;
