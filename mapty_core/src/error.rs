//! Error types for the mapty_core library.

use crate::types::{Field, WorkoutId};
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for mapty_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// User input rejected by the workout factory
    #[error("invalid input data: {0}")]
    Validation(#[from] ValidationError),

    /// Operation referenced a workout that is not in the store
    #[error("workout {0} not found")]
    NotFound(WorkoutId),

    /// Store already holds a workout with this id
    #[error("workout {0} already exists")]
    DuplicateId(WorkoutId),

    /// Every workout id has been used
    #[error("no workout ids left to allocate")]
    IdsExhausted,

    /// External identifier could not be normalized to a workout id
    #[error("invalid workout id: {0:?}")]
    InvalidId(String),

    /// Event is not valid in the current form state
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Persisted snapshot could not be decoded
    #[error("persisted workouts are corrupt: {0}")]
    PersistenceCorrupt(String),

    /// Key cannot be used by the key-value store
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A constraint broken by raw workout input.
///
/// Carries the offending field so the form can point at it.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: Field },

    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: Field, value: f64 },

    #[error("unknown workout type {0:?}")]
    UnknownType(String),
}

impl ValidationError {
    /// The field that failed, if the error is tied to one
    pub fn field(&self) -> Option<Field> {
        match self {
            ValidationError::NotFinite { field } | ValidationError::NotPositive { field, .. } => {
                Some(*field)
            }
            ValidationError::UnknownType(_) => None,
        }
    }
}
