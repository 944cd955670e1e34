//! Core domain types for Mapty.
//!
//! This module defines the workout record and the small value types around it:
//! - Workout identifiers and coordinates
//! - Workout kinds (running, cycling) and their typed payloads
//! - Form field names used in validation errors

use crate::error::ValidationError;
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers and Coordinates
// ============================================================================

/// Opaque, unique workout identifier
///
/// Serialized as a bare number so snapshots stay compatible with the
/// millisecond ids the first version of the app produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(u64);

impl WorkoutId {
    /// Largest id; once it exists no later workout can be numbered after it
    pub const MAX: WorkoutId = WorkoutId(u64::MAX);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize an identifier coming from outside (a list element, a CLI arg)
impl FromStr for WorkoutId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(WorkoutId)
            .map_err(|_| Error::InvalidId(s.to_string()))
    }
}

/// A latitude/longitude pair, persisted as `[lat, lng]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

// ============================================================================
// Workout Kinds
// ============================================================================

/// Type of workout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkoutKind::Running => "running",
            WorkoutKind::Cycling => "cycling",
        }
    }

    /// Capitalized name used in descriptions
    pub fn label(self) -> &'static str {
        match self {
            WorkoutKind::Running => "Running",
            WorkoutKind::Cycling => "Cycling",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            WorkoutKind::Running => "🏃‍♂️",
            WorkoutKind::Cycling => "🚴‍♀️",
        }
    }

    /// Marker popup style tag
    pub fn popup_style(self) -> String {
        format!("{}-popup", self.as_str())
    }

    /// The field holding this kind's type-specific value
    pub fn extra_field(self) -> Field {
        match self {
            WorkoutKind::Running => Field::Cadence,
            WorkoutKind::Cycling => Field::Elevation,
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "running" => Ok(WorkoutKind::Running),
            "cycling" => Ok(WorkoutKind::Cycling),
            _ => Err(ValidationError::UnknownType(s.to_string())),
        }
    }
}

/// Numeric form fields, named in validation errors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Distance,
    Duration,
    Cadence,
    Elevation,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Distance => "distance",
            Field::Duration => "duration",
            Field::Cadence => "cadence",
            Field::Elevation => "elevation",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Workout Record
// ============================================================================

/// Type-specific payload with its derived metric
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Activity {
    /// Cadence in steps/min, pace in min/km
    Running { cadence: f64, pace: f64 },
    /// Elevation gain in meters, speed in km/h
    Cycling { elevation: f64, speed: f64 },
}

impl Activity {
    pub fn kind(&self) -> WorkoutKind {
        match self {
            Activity::Running { .. } => WorkoutKind::Running,
            Activity::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

/// A recorded workout
///
/// Fields are private: records come out of the factory (or are restored whole
/// by the codec) and never change afterwards. Deserializing goes through
/// [`check_invariants`](Self::check_invariants), so a decoded record is as
/// sound as a built one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkoutRecord")]
pub struct Workout {
    id: WorkoutId,
    distance: f64,
    duration: f64,
    coords: Coords,
    date: DateTime<Utc>,
    description: String,
    #[serde(flatten)]
    activity: Activity,
}

impl Workout {
    pub(crate) fn new(
        id: WorkoutId,
        distance: f64,
        duration: f64,
        coords: Coords,
        date: DateTime<Utc>,
        activity: Activity,
    ) -> Self {
        let description = describe(activity.kind(), date);
        Self {
            id,
            distance,
            duration,
            coords,
            date,
            description,
            activity,
        }
    }

    pub fn id(&self) -> WorkoutId {
        self.id
    }

    /// Distance in km
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Duration in minutes
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn coords(&self) -> Coords {
        self.coords
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn kind(&self) -> WorkoutKind {
        self.activity.kind()
    }

    pub fn pace(&self) -> Option<f64> {
        match self.activity {
            Activity::Running { pace, .. } => Some(pace),
            Activity::Cycling { .. } => None,
        }
    }

    pub fn speed(&self) -> Option<f64> {
        match self.activity {
            Activity::Cycling { speed, .. } => Some(speed),
            Activity::Running { .. } => None,
        }
    }

    pub fn cadence(&self) -> Option<f64> {
        match self.activity {
            Activity::Running { cadence, .. } => Some(cadence),
            Activity::Cycling { .. } => None,
        }
    }

    pub fn elevation(&self) -> Option<f64> {
        match self.activity {
            Activity::Cycling { elevation, .. } => Some(elevation),
            Activity::Running { .. } => None,
        }
    }

    /// Cadence for running, elevation for cycling
    pub fn extra_value(&self) -> f64 {
        match self.activity {
            Activity::Running { cadence, .. } => cadence,
            Activity::Cycling { elevation, .. } => elevation,
        }
    }

    pub fn icon(&self) -> &'static str {
        self.kind().icon()
    }

    /// Pace or speed, whichever this workout carries
    pub fn metric_value(&self) -> f64 {
        match self.activity {
            Activity::Running { pace, .. } => pace,
            Activity::Cycling { speed, .. } => speed,
        }
    }

    pub fn metric_unit(&self) -> &'static str {
        match self.activity {
            Activity::Running { .. } => "min/km",
            Activity::Cycling { .. } => "km/h",
        }
    }

    /// Check the field invariants a factory-built record always satisfies
    ///
    /// Used by the codec to reject snapshots that were edited by hand or
    /// written by something else.
    pub(crate) fn check_invariants(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            (Field::Distance, self.distance),
            (Field::Duration, self.duration),
            (self.kind().extra_field(), self.extra_value()),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field });
            }
        }
        for (field, value) in [
            (Field::Distance, self.distance),
            (Field::Duration, self.duration),
        ] {
            if value <= 0.0 {
                return Err(ValidationError::NotPositive { field, value });
            }
        }
        if let Activity::Running { cadence, .. } = self.activity {
            if cadence <= 0.0 {
                return Err(ValidationError::NotPositive {
                    field: Field::Cadence,
                    value: cadence,
                });
            }
        }
        Ok(())
    }
}

/// Unchecked wire form of a [`Workout`]
#[derive(Deserialize)]
struct WorkoutRecord {
    id: WorkoutId,
    distance: f64,
    duration: f64,
    coords: Coords,
    date: DateTime<Utc>,
    description: String,
    #[serde(flatten)]
    activity: Activity,
}

impl TryFrom<WorkoutRecord> for Workout {
    type Error = ValidationError;

    fn try_from(record: WorkoutRecord) -> Result<Self, Self::Error> {
        let workout = Workout {
            id: record.id,
            distance: record.distance,
            duration: record.duration,
            coords: record.coords,
            date: record.date,
            description: record.description,
            activity: record.activity,
        };
        workout.check_invariants()?;
        Ok(workout)
    }
}

/// Build the display description, e.g. "🏃‍♂️ Running on October 19"
pub fn describe(kind: WorkoutKind, date: DateTime<Utc>) -> String {
    format!("{} {} on {}", kind.icon(), kind.label(), date.format("%B %-d"))
}
