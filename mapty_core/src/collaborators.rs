//! Interfaces to the map and form the orchestrator drives.
//!
//! The core never sees map or widget internals: it hands out coordinates and
//! text, and keeps only opaque [`MarkerHandle`]s.

use crate::error::ValidationError;
use crate::types::{Coords, Workout, WorkoutKind};

/// Opaque marker reference issued by a [`MapCollaborator`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerHandle(u64);

impl MarkerHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Map surface: markers and viewport
pub trait MapCollaborator {
    /// Place a marker with an open popup showing `popup_text`
    ///
    /// `style_tag` is `"running-popup"` or `"cycling-popup"`.
    fn create_marker(&mut self, coords: Coords, popup_text: &str, style_tag: &str) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle);
    fn set_view(&mut self, coords: Coords, zoom_level: u8);
}

/// Raw field text as read from the form
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawFields {
    pub kind: String,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

/// Values used to pre-populate the form when editing
#[derive(Clone, Debug, PartialEq)]
pub struct FormPrefill {
    pub kind: WorkoutKind,
    pub distance: f64,
    pub duration: f64,
    /// Cadence for running, elevation for cycling
    pub cadence_or_elevation: f64,
}

impl From<&Workout> for FormPrefill {
    fn from(workout: &Workout) -> Self {
        Self {
            kind: workout.kind(),
            distance: workout.distance(),
            duration: workout.duration(),
            cadence_or_elevation: workout.extra_value(),
        }
    }
}

impl From<&FormPrefill> for RawFields {
    fn from(prefill: &FormPrefill) -> Self {
        let extra = prefill.cadence_or_elevation.to_string();
        let (cadence, elevation) = match prefill.kind {
            WorkoutKind::Running => (extra, String::new()),
            WorkoutKind::Cycling => (String::new(), extra),
        };
        Self {
            kind: prefill.kind.to_string(),
            distance: prefill.distance.to_string(),
            duration: prefill.duration.to_string(),
            cadence,
            elevation,
        }
    }
}

/// Workout entry form
pub trait FormCollaborator {
    /// Show the form, blank when `prefill` is `None`
    fn show(&mut self, prefill: Option<&FormPrefill>);
    fn hide(&mut self);
    fn read(&self) -> RawFields;
    /// Show the cadence or elevation input to match `kind`
    fn toggle_type_fields(&mut self, kind: WorkoutKind);
    /// Tell the user their input was rejected
    fn report_invalid(&mut self, error: &ValidationError);
}
