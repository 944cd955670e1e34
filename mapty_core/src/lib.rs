#![forbid(unsafe_code)]

//! Core domain model and lifecycle engine for Mapty.
//!
//! This crate provides:
//! - Domain types (workouts, running/cycling payloads, coordinates)
//! - Workout factory with validation and derived metrics
//! - Ordered workout store
//! - Snapshot codec and key-value persistence
//! - The orchestrator driving map and form collaborators
//! - CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod factory;
pub mod store;
pub mod codec;
pub mod kv;
pub mod collaborators;
pub mod orchestrator;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result, ValidationError};
pub use types::*;
pub use config::Config;
pub use factory::{WorkoutFactory, WorkoutInput};
pub use store::WorkoutStore;
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use collaborators::{FormCollaborator, FormPrefill, MapCollaborator, MarkerHandle, RawFields};
pub use orchestrator::{Event, FormMode, FormState, Orchestrator, Outcome};
pub use export::export_csv;
