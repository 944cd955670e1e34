use clap::{Parser, Subcommand};
use mapty_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mapty")]
#[command(about = "Map-based running and cycling workout log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a new workout at a location
    Add {
        /// Workout type (running, cycling)
        #[arg(value_parser = parse_kind)]
        kind: WorkoutKind,

        /// Latitude of the workout
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude of the workout
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// List workouts in the order they were logged
    List,

    /// Replace a workout with edited values (unspecified fields are kept)
    Edit {
        id: String,

        /// Change the workout type
        #[arg(long = "type", value_parser = parse_kind)]
        kind: Option<WorkoutKind>,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete a workout
    Delete { id: String },

    /// Centre the map on a workout
    Show { id: String },

    /// Delete every workout
    Clear,

    /// Export workouts to a CSV file
    Export { path: PathBuf },
}

/// Raw form values; validated by the core, not by the argument parser
#[derive(clap::Args, Default)]
struct FieldArgs {
    /// Distance in km
    #[arg(long, allow_hyphen_values = true)]
    distance: Option<String>,

    /// Duration in minutes
    #[arg(long, allow_hyphen_values = true)]
    duration: Option<String>,

    /// Cadence in steps/min (running)
    #[arg(long, allow_hyphen_values = true)]
    cadence: Option<String>,

    /// Elevation gain in meters (cycling)
    #[arg(long, allow_hyphen_values = true)]
    elevation: Option<String>,
}

fn parse_kind(s: &str) -> std::result::Result<WorkoutKind, String> {
    s.parse().map_err(|e: ValidationError| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    mapty_core::logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        // The form has already told the user what was wrong with the input
        Err(Error::Validation(_)) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    let form = match &cli.command {
        Commands::Add { fields, .. } | Commands::Edit { fields, .. } => ArgsForm::new(fields),
        _ => ArgsForm::default(),
    };
    let mut app = Orchestrator::load(
        ConsoleMap::default(),
        form,
        FileKeyValueStore::new(&data_dir),
        &config,
    );

    match cli.command {
        Commands::Add { kind, lat, lng, .. } => cmd_add(&mut app, kind, Coords::new(lat, lng)),
        Commands::List => {
            cmd_list(&app);
            Ok(())
        }
        Commands::Edit { id, kind, .. } => cmd_edit(&mut app, &id, kind),
        Commands::Delete { id } => cmd_delete(&mut app, &id),
        Commands::Show { id } => cmd_show(&mut app, &id),
        Commands::Clear => cmd_clear(&mut app),
        Commands::Export { path } => {
            let count = export_csv(app.workouts(), &path)?;
            println!("✓ Exported {} workouts to {}", count, path.display());
            Ok(())
        }
    }
}

type App = Orchestrator<ConsoleMap, ArgsForm, FileKeyValueStore>;

fn cmd_add(app: &mut App, kind: WorkoutKind, coords: Coords) -> Result<()> {
    app.on_map_click(coords);
    app.on_type_change(kind);

    if let Outcome::Created(id) = app.submit()? {
        let workout = app.store().find_by_id(id)?;
        println!("✓ Logged {} (id {})", workout.description(), id);
    }
    Ok(())
}

fn cmd_list(app: &App) {
    if app.workouts().is_empty() {
        println!("No workouts recorded yet.");
        return;
    }
    for workout in app.workouts() {
        display_workout(workout);
    }
}

fn cmd_edit(app: &mut App, id: &str, kind: Option<WorkoutKind>) -> Result<()> {
    app.request_edit(id)?;
    if let Some(kind) = kind {
        app.on_type_change(kind);
    }

    match app.submit()? {
        Outcome::Replaced { old, new } => {
            println!("✓ Replaced workout {} with {}", old, new);
            display_workout(app.store().find_by_id(new)?);
        }
        Outcome::Created(new) => {
            println!("✓ Logged workout {}", new);
        }
        _ => {}
    }
    Ok(())
}

fn cmd_delete(app: &mut App, id: &str) -> Result<()> {
    if let Outcome::Deleted { id, now_empty } = app.delete(id)? {
        println!("✓ Deleted workout {}", id);
        if now_empty {
            println!("  No workouts left.");
        }
    }
    Ok(())
}

fn cmd_show(app: &mut App, id: &str) -> Result<()> {
    if let Outcome::Selected(id) = app.select(id)? {
        display_workout(app.store().find_by_id(id)?);
    }
    Ok(())
}

fn cmd_clear(app: &mut App) -> Result<()> {
    if let Outcome::Cleared { removed } = app.clear_all()? {
        println!("✓ Cleared {} workouts", removed);
    }
    Ok(())
}

fn display_workout(workout: &Workout) {
    println!("{}  [id {}]", workout.description(), workout.id());
    let extra = match workout.activity() {
        Activity::Running { cadence, .. } => format!("🦶🏼 {} spm", cadence),
        Activity::Cycling { elevation, .. } => format!("⛰ {} m", elevation),
    };
    println!(
        "   {} {} km · ⏱ {} min · ⚡️ {:.1} {} · {}",
        workout.icon(),
        workout.distance(),
        workout.duration(),
        workout.metric_value(),
        workout.metric_unit(),
        extra
    );
}

// ============================================================================
// Terminal collaborators
// ============================================================================

/// Map stand-in: tracks marker handles and reports where it centres
#[derive(Default)]
struct ConsoleMap {
    next_handle: u64,
}

impl MapCollaborator for ConsoleMap {
    fn create_marker(&mut self, coords: Coords, popup_text: &str, style_tag: &str) -> MarkerHandle {
        self.next_handle += 1;
        tracing::debug!(
            "Marker {} at ({}) [{}]: {}",
            self.next_handle,
            coords,
            style_tag,
            popup_text
        );
        MarkerHandle::new(self.next_handle)
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        tracing::debug!("Marker {} removed", handle.get());
    }

    fn set_view(&mut self, coords: Coords, zoom_level: u8) {
        println!("📍 Centred map on {} (zoom {})", coords, zoom_level);
    }
}

/// Form backed by command-line flags
///
/// Flags given on the command line win over whatever the form was shown with,
/// so `edit` only needs the fields that change.
#[derive(Default)]
struct ArgsForm {
    shown: RawFields,
    distance: Option<String>,
    duration: Option<String>,
    cadence: Option<String>,
    elevation: Option<String>,
}

impl ArgsForm {
    fn new(args: &FieldArgs) -> Self {
        Self {
            shown: RawFields::default(),
            distance: args.distance.clone(),
            duration: args.duration.clone(),
            cadence: args.cadence.clone(),
            elevation: args.elevation.clone(),
        }
    }
}

impl FormCollaborator for ArgsForm {
    fn show(&mut self, prefill: Option<&FormPrefill>) {
        self.shown = match prefill {
            Some(prefill) => RawFields::from(prefill),
            None => RawFields {
                kind: WorkoutKind::Running.to_string(),
                ..RawFields::default()
            },
        };
    }

    fn hide(&mut self) {
        self.shown = RawFields::default();
    }

    fn read(&self) -> RawFields {
        let pick = |flag: &Option<String>, shown: &String| flag.clone().unwrap_or_else(|| shown.clone());
        RawFields {
            kind: self.shown.kind.clone(),
            distance: pick(&self.distance, &self.shown.distance),
            duration: pick(&self.duration, &self.shown.duration),
            cadence: pick(&self.cadence, &self.shown.cadence),
            elevation: pick(&self.elevation, &self.shown.elevation),
        }
    }

    fn toggle_type_fields(&mut self, kind: WorkoutKind) {
        self.shown.kind = kind.to_string();
    }

    fn report_invalid(&mut self, error: &ValidationError) {
        eprintln!("invalid input data: {}", error);
    }
}
