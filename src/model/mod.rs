//! Data Model
//!
//! The hospital status document and the editable form derived from it.

mod form;
mod status;

pub use form::{coerce_count, ResourceField, ResourceForm};
pub use status::{
    BloodType, BloodUnits, HospitalStatus, LAST_UPDATED_FIELD, STATUS_COLLECTION,
    STATUS_DOCUMENT,
};

use thiserror::Error;

/// Errors decoding or addressing model values
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Document body is not a JSON object")]
    NotAnObject,

    #[error("Unknown blood type: {0}")]
    UnknownBloodType(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
