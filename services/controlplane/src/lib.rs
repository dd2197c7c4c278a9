//! Portfolio control-plane service library crate.
//!
//! # Purpose
//! Exposes the HTTP API surface, auth helpers, configuration, workflows, and
//! storage implementations for use by the binary and tests.
//!
//! # Notes
//! Module boundaries mirror the HTTP API and storage layers for clarity.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod store;
pub mod workflow;
