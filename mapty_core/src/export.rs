//! CSV export of the workout log.
//!
//! The target file is replaced atomically: rows are written to a temp file in
//! the same directory, synced, then renamed over the destination.

use crate::{Error, Result, Workout};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: u64,
    #[serde(rename = "type")]
    kind: &'static str,
    date: String,
    description: String,
    lat: f64,
    lng: f64,
    distance: f64,
    duration: f64,
    cadence: Option<f64>,
    elevation: Option<f64>,
    pace: Option<f64>,
    speed: Option<f64>,
}

impl From<&Workout> for CsvRow {
    fn from(workout: &Workout) -> Self {
        let coords = workout.coords();
        CsvRow {
            id: workout.id().get(),
            kind: workout.kind().as_str(),
            date: workout.date().to_rfc3339(),
            description: workout.description().to_string(),
            lat: coords.lat,
            lng: coords.lng,
            distance: workout.distance(),
            duration: workout.duration(),
            cadence: workout.cadence(),
            elevation: workout.elevation(),
            pace: workout.pace(),
            speed: workout.speed(),
        }
    }
}

/// Write every workout to `path` as CSV, in list order
///
/// Returns the number of rows written. An empty log still produces a header.
pub fn export_csv(workouts: &[Workout], path: &Path) -> Result<usize> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(temp.as_file());

        // Header written explicitly so an empty export is still well-formed
        writer.write_record([
            "id",
            "type",
            "date",
            "description",
            "lat",
            "lng",
            "distance",
            "duration",
            "cadence",
            "elevation",
            "pace",
            "speed",
        ])?;
        for workout in workouts {
            writer.serialize(CsvRow::from(workout))?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} workouts to {:?}", workouts.len(), path);
    Ok(workouts.len())
}
