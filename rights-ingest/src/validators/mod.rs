//! Validation layer
//!
//! # Validators
//! 1. **metadata_validator** - Required fields and identifier formats for canonical metadata

pub mod metadata_validator;

pub use metadata_validator::{
    validate, validate_for_registration, MetadataValidator, CHECKS, RegistrationReadiness,
    ValidationReport,
};
