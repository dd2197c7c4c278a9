//! Caller identity extraction and role checks.
pub mod principal;

pub use principal::{Principal, Role};
