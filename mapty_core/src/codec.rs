//! Snapshot encoding for the workout collection.
//!
//! A snapshot is a JSON array of flat workout objects:
//! `{id, distance, duration, coords: [lat, lng], date, description, type,
//! cadence | elevation, pace | speed}`. Derived fields are stored as-is so a
//! restored workout is identical to the one the factory built.

use crate::{Error, Result, Workout, WorkoutId};
use std::collections::HashSet;

/// Encode workouts, in order, as snapshot text
pub fn serialize(workouts: &[Workout]) -> Result<String> {
    // Compact output keeps the full-overwrite write after each mutation small
    Ok(serde_json::to_string(workouts)?)
}

/// Decode a snapshot, reporting why it is unusable
///
/// Unknown fields are ignored. A snapshot is rejected as a whole when it does
/// not parse, when a record breaks a field invariant, when an id repeats, or
/// when an id leaves no room to number new workouts after it.
pub fn try_deserialize(text: &str) -> Result<Vec<Workout>> {
    let workouts: Vec<Workout> =
        serde_json::from_str(text).map_err(|e| Error::PersistenceCorrupt(e.to_string()))?;

    let mut seen = HashSet::with_capacity(workouts.len());
    for workout in &workouts {
        if workout.id() == WorkoutId::MAX {
            return Err(Error::PersistenceCorrupt(format!(
                "workout id {} is out of range",
                workout.id()
            )));
        }
        if !seen.insert(workout.id()) {
            return Err(Error::PersistenceCorrupt(format!(
                "workout {} appears more than once",
                workout.id()
            )));
        }
    }

    Ok(workouts)
}

/// Decode a snapshot, treating absent or corrupt data as an empty collection
pub fn deserialize(text: Option<&str>) -> Vec<Workout> {
    let Some(text) = text else {
        tracing::info!("No saved workouts found, starting empty");
        return Vec::new();
    };

    match try_deserialize(text) {
        Ok(workouts) => {
            tracing::debug!("Decoded {} workouts from snapshot", workouts.len());
            workouts
        }
        Err(e) => {
            tracing::warn!("{}. Starting with no workouts.", e);
            Vec::new()
        }
    }
}
