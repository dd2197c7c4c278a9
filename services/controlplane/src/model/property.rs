//! Property model definitions.
//!
//! # Purpose
//! Defines landlord-owned property records used by the store and HTTP API.
//! The active invite code is denormalized onto the property so portal views
//! can resolve it without a secondary lookup.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Property {
    pub landlord_id: String,
    pub property_id: String,
    pub name: String,
    /// Active invite code for this property, if one has been issued.
    ///
    /// Kept in sync by the invite-code workflow: regeneration replaces it,
    /// revocation clears it. The code record remains authoritative; readers
    /// of this field must verify the referenced code is still active.
    pub invite_code: Option<String>,
    pub created_at_ms: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    pub landlord_id: String,
    pub property_id: String,
}

impl PropertyKey {
    pub fn of(property: &Property) -> Self {
        Self {
            landlord_id: property.landlord_id.clone(),
            property_id: property.property_id.clone(),
        }
    }
}
