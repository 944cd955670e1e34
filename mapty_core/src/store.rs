//! In-memory workout collection.
//!
//! Workouts are kept in insertion order, which is also the order they are
//! listed and persisted in.

use crate::{Error, Result, Workout, WorkoutId};

/// Ordered collection of workouts keyed by id
#[derive(Clone, Debug, Default)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
}

impl WorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an already ordered sequence
    ///
    /// Fails on the first repeated id and keeps nothing in that case.
    pub fn from_workouts(workouts: Vec<Workout>) -> Result<Self> {
        let mut store = Self::new();
        for workout in workouts {
            store.add(workout)?;
        }
        Ok(store)
    }

    /// Append a workout
    pub fn add(&mut self, workout: Workout) -> Result<()> {
        if self.position(workout.id()).is_some() {
            return Err(Error::DuplicateId(workout.id()));
        }
        tracing::debug!("Store add {}", workout.id());
        self.workouts.push(workout);
        Ok(())
    }

    pub fn find_by_id(&self, id: WorkoutId) -> Result<&Workout> {
        self.position(id)
            .map(|idx| &self.workouts[idx])
            .ok_or(Error::NotFound(id))
    }

    pub fn contains(&self, id: WorkoutId) -> bool {
        self.position(id).is_some()
    }

    /// Remove a workout, keeping the order of the rest
    pub fn remove_by_id(&mut self, id: WorkoutId) -> Result<Workout> {
        let idx = self.position(id).ok_or(Error::NotFound(id))?;
        tracing::debug!("Store remove {}", id);
        Ok(self.workouts.remove(idx))
    }

    /// Workouts in insertion order
    pub fn list(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    /// Drop every workout, returning them in order
    pub fn clear(&mut self) -> Vec<Workout> {
        std::mem::take(&mut self.workouts)
    }

    fn position(&self, id: WorkoutId) -> Option<usize> {
        self.workouts.iter().position(|w| w.id() == id)
    }
}
