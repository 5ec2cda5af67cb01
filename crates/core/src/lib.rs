//! `griya-core`: property attributes shared by every other crate.
//!
//! Holds the record a form submission produces, the constraints the form
//! declares for each field, and the checks run before a model is consulted.

pub mod currency;
pub mod form;
pub mod property;
pub mod validation;

pub use currency::format_rupiah;
pub use form::{FieldSpec, FormProfile};
pub use property::{City, Furnishing, PropertyRecord};
pub use validation::{validate_sizes, ValidationFailure};
