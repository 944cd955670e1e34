//! Workout construction and input validation.
//!
//! The factory is the only place a new [`Workout`] is built, so the derived
//! metric (pace or speed) and the description are computed exactly once here.

use crate::collaborators::RawFields;
use crate::error::{Error, Result, ValidationError};
use crate::types::{Activity, Coords, Field, Workout, WorkoutId, WorkoutKind};
use chrono::{DateTime, Utc};

/// Numeric workout input, parsed from raw form text but not yet validated
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutInput {
    pub kind: WorkoutKind,
    pub distance: f64,
    pub duration: f64,
    /// Cadence for running, elevation for cycling
    pub extra: f64,
}

impl WorkoutInput {
    /// Convert raw form text into numbers
    ///
    /// Follows numeric form-input coercion: blank reads as 0 and anything
    /// unparsable reads as NaN, both of which validation then rejects where
    /// the field is required. Only the field matching the type is read.
    pub fn from_raw(raw: &RawFields) -> std::result::Result<Self, ValidationError> {
        let kind: WorkoutKind = raw.kind.parse()?;
        let extra = match kind {
            WorkoutKind::Running => &raw.cadence,
            WorkoutKind::Cycling => &raw.elevation,
        };
        Ok(Self {
            kind,
            distance: coerce_number(&raw.distance),
            duration: coerce_number(&raw.duration),
            extra: coerce_number(extra),
        })
    }
}

fn coerce_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    text.parse().unwrap_or(f64::NAN)
}

/// Monotonic id source
///
/// Ids look like creation timestamps in milliseconds, but two ids handed out
/// within the same millisecond (or after the clock steps back) still differ.
/// Once [`WorkoutId::MAX`] has been handed out or observed the generator is
/// exhausted and refuses to repeat it.
#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id for a workout created at `now`
    pub fn next_at(&mut self, now: DateTime<Utc>) -> Result<WorkoutId> {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let after_last = self.last.checked_add(1).ok_or(Error::IdsExhausted)?;
        let id = millis.max(after_last);
        self.last = id;
        Ok(WorkoutId::new(id))
    }

    /// Make sure future ids sort after an id that already exists
    pub fn observe(&mut self, id: WorkoutId) {
        self.last = self.last.max(id.get());
    }
}

/// Builds validated workouts
#[derive(Clone, Debug, Default)]
pub struct WorkoutFactory {
    ids: IdGenerator,
}

impl WorkoutFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the id generator with ids restored from storage
    pub fn observe_existing<'a>(&mut self, workouts: impl IntoIterator<Item = &'a Workout>) {
        for workout in workouts {
            self.ids.observe(workout.id());
        }
    }

    /// Validate input and build a workout stamped with the current time
    pub fn create(
        &mut self,
        kind: WorkoutKind,
        distance: f64,
        duration: f64,
        coords: Coords,
        extra: f64,
    ) -> Result<Workout> {
        self.create_at(kind, distance, duration, coords, extra, Utc::now())
    }

    /// Same as [`create`](Self::create) with an explicit creation time
    pub fn create_at(
        &mut self,
        kind: WorkoutKind,
        distance: f64,
        duration: f64,
        coords: Coords,
        extra: f64,
        now: DateTime<Utc>,
    ) -> Result<Workout> {
        validate(kind, distance, duration, extra)?;

        let activity = match kind {
            WorkoutKind::Running => Activity::Running {
                cadence: extra,
                pace: duration / distance,
            },
            WorkoutKind::Cycling => Activity::Cycling {
                elevation: extra,
                speed: distance / (duration / 60.0),
            },
        };

        let id = self.ids.next_at(now)?;
        let workout = Workout::new(id, distance, duration, coords, now, activity);
        tracing::debug!("Created {} workout {}", kind, id);
        Ok(workout)
    }

    /// Build from parsed form input
    pub fn create_from(
        &mut self,
        input: &WorkoutInput,
        coords: Coords,
    ) -> Result<Workout> {
        self.create(input.kind, input.distance, input.duration, coords, input.extra)
    }
}

/// Check raw numbers against the workout constraints
///
/// Every field must be finite; distance and duration must be positive, and so
/// must cadence for running. Cycling elevation may be zero or negative.
pub fn validate(
    kind: WorkoutKind,
    distance: f64,
    duration: f64,
    extra: f64,
) -> std::result::Result<(), ValidationError> {
    let extra_field = kind.extra_field();

    for (field, value) in [
        (Field::Distance, distance),
        (Field::Duration, duration),
        (extra_field, extra),
    ] {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
    }

    let mut required = vec![(Field::Distance, distance), (Field::Duration, duration)];
    if kind == WorkoutKind::Running {
        required.push((Field::Cadence, extra));
    }
    for (field, value) in required {
        if value <= 0.0 {
            return Err(ValidationError::NotPositive { field, value });
        }
    }

    Ok(())
}
