//! HTTP API modules for the portfolio control plane.
pub mod error;
pub mod invites;
pub mod openapi;
pub mod properties;
pub mod system;
pub mod tenancies;
pub mod types;
pub mod units;
