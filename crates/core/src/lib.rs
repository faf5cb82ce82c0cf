//! Core traits and types for VetChat
//!
//! This crate provides the foundational types shared by every other crate:
//! - Request-scoped domain types (classification, location, facility, reply)
//! - The `Classifier` capability trait
//! - The crate-wide error type

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::Classifier;
pub use types::{
    ClassificationResult, Facility, GeoResult, LocationKind, LocationQuery, Reply, ReplyRoute,
    CRISIS_TOPIC, NO_PHONE,
};
