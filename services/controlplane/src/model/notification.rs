//! Landlord notification records.
//!
//! # Purpose
//! A notification is created when a tenant requests to join a unit and is
//! cleared when the landlord resolves the request (approve or decline) or
//! when a token acceptance settles the same unit.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    JoinRequested,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Notification {
    pub notification_id: String,
    pub landlord_id: String,
    pub property_id: String,
    pub unit_id: String,
    pub tenant_id: String,
    pub tenant_name: String,
    pub kind: NotificationKind,
    pub created_at_ms: i64,
}
