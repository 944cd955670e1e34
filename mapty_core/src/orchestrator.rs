//! Workout lifecycle: create, edit-replace, delete.
//!
//! The [`Orchestrator`] owns the store, the factory and the marker table, and
//! drives the map, form and key-value collaborators. Every handler runs to
//! completion and persists a full snapshot after any change to the store.
//!
//! ## Form states
//!
//! - `Idle` → `Open(Create)` on a map click
//! - `Idle | Open(_)` → `Open(Edit)` on an edit request; the form is
//!   pre-populated and the target's coordinates are reused
//! - `Open(_)` → `Idle` on a successful submit or a cancel
//!
//! A rejected submit leaves the form open and touches nothing else.

use crate::codec;
use crate::collaborators::{FormCollaborator, FormPrefill, MapCollaborator, MarkerHandle};
use crate::factory::{WorkoutFactory, WorkoutInput};
use crate::kv::KeyValueStore;
use crate::store::WorkoutStore;
use crate::{Config, Coords, Error, Result, Workout, WorkoutId, WorkoutKind};
use std::collections::HashMap;

/// What a submit will do
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FormMode {
    /// New workout at the clicked coordinates
    Create { coords: Coords },
    /// Replace `target`, keeping its coordinates
    Edit { target: WorkoutId, coords: Coords },
}

impl FormMode {
    pub fn coords(&self) -> Coords {
        match self {
            FormMode::Create { coords } | FormMode::Edit { coords, .. } => *coords,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Open(FormMode),
}

/// A user-initiated event, carrying identifiers as the UI supplies them
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    MapClick(Coords),
    Submit,
    Cancel,
    Edit(String),
    Delete(String),
    Select(String),
    TypeChange(WorkoutKind),
    ClearAll,
}

/// Result of a handled event
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    FormOpened,
    FormClosed,
    Created(WorkoutId),
    Replaced { old: WorkoutId, new: WorkoutId },
    /// `now_empty` tells the UI to hide its clear-all control
    Deleted { id: WorkoutId, now_empty: bool },
    Selected(WorkoutId),
    TypeChanged(WorkoutKind),
    Cleared { removed: usize },
}

/// Lifecycle engine and context object for one session
pub struct Orchestrator<M, F, K> {
    map: M,
    form: F,
    kv: K,
    store: WorkoutStore,
    factory: WorkoutFactory,
    markers: HashMap<WorkoutId, MarkerHandle>,
    state: FormState,
    storage_key: String,
    zoom_level: u8,
}

impl<M, F, K> Orchestrator<M, F, K>
where
    M: MapCollaborator,
    F: FormCollaborator,
    K: KeyValueStore,
{
    /// Restore saved workouts and put a marker on the map for each
    ///
    /// Unreadable or corrupt storage starts an empty session rather than
    /// failing.
    pub fn load(map: M, form: F, kv: K, config: &Config) -> Self {
        let storage_key = config.storage.key.clone();

        let snapshot = kv.get(&storage_key).unwrap_or_else(|e| {
            tracing::warn!("Unable to read saved workouts: {}. Starting empty.", e);
            None
        });
        let workouts = codec::deserialize(snapshot.as_deref());

        let mut factory = WorkoutFactory::new();
        factory.observe_existing(&workouts);

        let store = WorkoutStore::from_workouts(workouts).unwrap_or_else(|e| {
            tracing::warn!("{}. Starting with no workouts.", e);
            WorkoutStore::new()
        });

        let mut orchestrator = Self {
            map,
            form,
            kv,
            store,
            factory,
            markers: HashMap::new(),
            state: FormState::Idle,
            storage_key,
            zoom_level: config.map.zoom_level,
        };

        let ids: Vec<_> = orchestrator.store.list().iter().map(Workout::id).collect();
        for id in ids {
            orchestrator.attach_marker(id);
        }

        tracing::info!("Loaded {} workouts", orchestrator.store.len());
        orchestrator
    }

    /// Route an event to its handler
    pub fn dispatch(&mut self, event: Event) -> Result<Outcome> {
        match event {
            Event::MapClick(coords) => Ok(self.on_map_click(coords)),
            Event::Submit => self.submit(),
            Event::Cancel => Ok(self.cancel()),
            Event::Edit(id) => self.request_edit(&id),
            Event::Delete(id) => self.delete(&id),
            Event::Select(id) => self.select(&id),
            Event::TypeChange(kind) => Ok(self.on_type_change(kind)),
            Event::ClearAll => self.clear_all(),
        }
    }

    /// Open a blank form for a workout at `coords`
    pub fn on_map_click(&mut self, coords: Coords) -> Outcome {
        self.state = FormState::Open(FormMode::Create { coords });
        self.form.show(None);
        Outcome::FormOpened
    }

    /// Open the form pre-filled from an existing workout
    pub fn request_edit(&mut self, id: &str) -> Result<Outcome> {
        let id = self.locate(id)?;
        let workout = self.store.find_by_id(id)?;
        let prefill = FormPrefill::from(workout);
        let coords = workout.coords();

        self.state = FormState::Open(FormMode::Edit { target: id, coords });
        self.form.show(Some(&prefill));
        tracing::debug!("Editing workout {}", id);
        Ok(Outcome::FormOpened)
    }

    /// Build a workout from the form and commit it
    ///
    /// In edit mode the replacement is committed before the original is
    /// removed, so the store always holds a version of the edited workout.
    pub fn submit(&mut self) -> Result<Outcome> {
        let FormState::Open(mode) = self.state else {
            return Err(Error::InvalidState("submit with no open form"));
        };

        let raw = self.form.read();
        let built = WorkoutInput::from_raw(&raw)
            .map_err(Error::from)
            .and_then(|input| self.factory.create_from(&input, mode.coords()));
        let workout = match built {
            Ok(workout) => workout,
            Err(Error::Validation(e)) => {
                tracing::info!("Rejected workout input: {}", e);
                self.form.report_invalid(&e);
                return Err(e.into());
            }
            Err(e) => {
                tracing::error!("Unable to create workout: {}", e);
                return Err(e);
            }
        };

        let new_id = workout.id();
        self.store.add(workout)?;
        self.attach_marker(new_id);

        let outcome = match mode {
            FormMode::Create { .. } => Outcome::Created(new_id),
            FormMode::Edit { target, .. } => match self.detach(target) {
                Ok(_) => Outcome::Replaced {
                    old: target,
                    new: new_id,
                },
                Err(e) => {
                    tracing::error!(
                        "Edited workout {} missing during replacement, keeping {}: {}",
                        target,
                        new_id,
                        e
                    );
                    Outcome::Created(new_id)
                }
            },
        };

        self.close_form();
        self.persist()?;
        Ok(outcome)
    }

    /// Close the form without changing anything
    pub fn cancel(&mut self) -> Outcome {
        if self.state != FormState::Idle {
            self.close_form();
        }
        Outcome::FormClosed
    }

    /// Remove a workout and its marker
    pub fn delete(&mut self, id: &str) -> Result<Outcome> {
        let id = self.locate(id)?;
        self.detach(id)?;

        if matches!(self.state, FormState::Open(FormMode::Edit { target, .. }) if target == id) {
            self.close_form();
        }

        self.persist()?;
        Ok(Outcome::Deleted {
            id,
            now_empty: self.store.is_empty(),
        })
    }

    /// Centre the map on a workout
    pub fn select(&mut self, id: &str) -> Result<Outcome> {
        let id = self.locate(id)?;
        let coords = self.store.find_by_id(id)?.coords();
        self.map.set_view(coords, self.zoom_level);
        Ok(Outcome::Selected(id))
    }

    /// Swap the form's cadence/elevation input
    pub fn on_type_change(&mut self, kind: WorkoutKind) -> Outcome {
        self.form.toggle_type_fields(kind);
        Outcome::TypeChanged(kind)
    }

    /// Forget every workout, in storage and on the map
    pub fn clear_all(&mut self) -> Result<Outcome> {
        self.kv.clear()?;

        for (_, handle) in self.markers.drain() {
            self.map.remove_marker(handle);
        }
        let removed = self.store.clear().len();
        if self.state != FormState::Idle {
            self.close_form();
        }

        tracing::info!("Cleared {} workouts", removed);
        Ok(Outcome::Cleared { removed })
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn workouts(&self) -> &[Workout] {
        self.store.list()
    }

    pub fn store(&self) -> &WorkoutStore {
        &self.store
    }

    /// Whether the clear-all control should be shown
    pub fn clear_all_visible(&self) -> bool {
        !self.store.is_empty()
    }

    pub fn marker_for(&self, id: WorkoutId) -> Option<MarkerHandle> {
        self.markers.get(&id).copied()
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Normalize an external id and check it is in the store
    fn locate(&self, raw: &str) -> Result<WorkoutId> {
        let id = raw.parse::<WorkoutId>().inspect_err(|e| {
            tracing::warn!("{}", e);
        })?;
        if !self.store.contains(id) {
            tracing::warn!("No workout with id {} in the store", id);
            return Err(Error::NotFound(id));
        }
        Ok(id)
    }

    fn attach_marker(&mut self, id: WorkoutId) {
        let Ok(workout) = self.store.find_by_id(id) else {
            return;
        };
        let handle = self.map.create_marker(
            workout.coords(),
            workout.description(),
            &workout.kind().popup_style(),
        );
        tracing::debug!("Marker {:?} bound to workout {}", handle, id);
        if let Some(stale) = self.markers.insert(id, handle) {
            self.map.remove_marker(stale);
        }
    }

    /// Release the marker, then drop the workout from the store
    fn detach(&mut self, id: WorkoutId) -> Result<Workout> {
        self.store.find_by_id(id)?;
        if let Some(handle) = self.markers.remove(&id) {
            self.map.remove_marker(handle);
        }
        self.store.remove_by_id(id)
    }

    fn close_form(&mut self) {
        self.form.hide();
        self.state = FormState::Idle;
    }

    fn persist(&mut self) -> Result<()> {
        let snapshot = codec::serialize(self.store.list())?;
        self.kv.set(&self.storage_key, &snapshot)?;
        tracing::debug!("Persisted {} workouts", self.store.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::RawFields;
    use crate::error::ValidationError;
    use crate::kv::MemoryKeyValueStore;
    use crate::types::Field;

    #[derive(Default)]
    struct FakeMap {
        next: u64,
        live: HashMap<MarkerHandle, (Coords, String, String)>,
        views: Vec<(Coords, u8)>,
    }

    impl MapCollaborator for FakeMap {
        fn create_marker(&mut self, coords: Coords, popup: &str, style: &str) -> MarkerHandle {
            self.next += 1;
            let handle = MarkerHandle::new(self.next);
            self.live
                .insert(handle, (coords, popup.to_string(), style.to_string()));
            handle
        }

        fn remove_marker(&mut self, handle: MarkerHandle) {
            assert!(self.live.remove(&handle).is_some(), "unknown marker");
        }

        fn set_view(&mut self, coords: Coords, zoom: u8) {
            self.views.push((coords, zoom));
        }
    }

    #[derive(Default)]
    struct FakeForm {
        visible: bool,
        fields: RawFields,
        prefills: Vec<FormPrefill>,
        toggles: Vec<WorkoutKind>,
        rejected: Vec<ValidationError>,
    }

    impl FakeForm {
        fn fill(&mut self, kind: &str, distance: &str, duration: &str, extra: &str) {
            self.fields = RawFields {
                kind: kind.into(),
                distance: distance.into(),
                duration: duration.into(),
                cadence: extra.into(),
                elevation: extra.into(),
            };
        }
    }

    impl FormCollaborator for FakeForm {
        fn show(&mut self, prefill: Option<&FormPrefill>) {
            self.visible = true;
            self.fields = match prefill {
                Some(p) => {
                    self.prefills.push(p.clone());
                    RawFields::from(p)
                }
                None => RawFields {
                    kind: "running".into(),
                    ..RawFields::default()
                },
            };
        }

        fn hide(&mut self) {
            self.visible = false;
        }

        fn read(&self) -> RawFields {
            self.fields.clone()
        }

        fn toggle_type_fields(&mut self, kind: WorkoutKind) {
            self.toggles.push(kind);
            self.fields.kind = kind.to_string();
        }

        fn report_invalid(&mut self, error: &ValidationError) {
            self.rejected.push(error.clone());
        }
    }

    type TestOrchestrator = Orchestrator<FakeMap, FakeForm, MemoryKeyValueStore>;

    fn setup() -> TestOrchestrator {
        crate::logging::init_test();
        Orchestrator::load(
            FakeMap::default(),
            FakeForm::default(),
            MemoryKeyValueStore::new(),
            &Config::default(),
        )
    }

    fn saved(orch: &TestOrchestrator) -> Vec<Workout> {
        let text = orch.kv().get("workouts").unwrap();
        codec::deserialize(text.as_deref())
    }

    fn add(orch: &mut TestOrchestrator, at: Coords, kind: &str, fields: [&str; 3]) -> WorkoutId {
        orch.on_map_click(at);
        orch.form_mut().fill(kind, fields[0], fields[1], fields[2]);
        match orch.submit().unwrap() {
            Outcome::Created(id) => id,
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn test_create_commits_marks_and_persists() {
        let mut orch = setup();
        let coords = Coords::new(51.5, -0.1);

        assert_eq!(orch.on_map_click(coords), Outcome::FormOpened);
        assert_eq!(orch.state(), FormState::Open(FormMode::Create { coords }));
        assert!(orch.form().visible);

        orch.form_mut().fill("running", "5", "25", "178");
        let id = match orch.submit().unwrap() {
            Outcome::Created(id) => id,
            other => panic!("unexpected {:?}", other),
        };

        let workout = orch.store().find_by_id(id).unwrap().clone();
        assert_eq!(workout.pace(), Some(5.0));
        assert_eq!(workout.coords(), coords);

        assert_eq!(orch.state(), FormState::Idle);
        assert!(!orch.form().visible);
        assert!(orch.clear_all_visible());

        let handle = orch.marker_for(id).unwrap();
        let (at, popup, style) = &orch.map().live[&handle];
        assert_eq!(*at, coords);
        assert_eq!(popup, workout.description());
        assert_eq!(style, "running-popup");

        assert_eq!(saved(&orch), vec![workout]);
    }

    #[test]
    fn test_rejected_create_changes_nothing() {
        let mut orch = setup();
        let coords = Coords::new(1.0, 1.0);
        orch.on_map_click(coords);
        orch.form_mut().fill("running", "5", "-25", "178");

        let err = orch.submit().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NotPositive {
                field: Field::Duration,
                ..
            })
        ));

        assert!(orch.store().is_empty());
        assert!(orch.map().live.is_empty());
        assert_eq!(orch.kv().get("workouts").unwrap(), None);
        assert_eq!(orch.state(), FormState::Open(FormMode::Create { coords }));
        assert_eq!(orch.form().rejected.len(), 1);
        assert!(orch.form().visible);
    }

    #[test]
    fn test_rejected_inputs_keep_collection_size() {
        let mut orch = setup();
        add(&mut orch, Coords::new(0.0, 0.0), "cycling", ["10", "30", "0"]);

        let bad = [
            ["0", "25", "170"],
            ["5", "0", "170"],
            ["5", "25", "0"],
            ["abc", "25", "170"],
            ["5", "inf", "170"],
            ["", "25", "170"],
        ];
        for fields in bad {
            orch.on_map_click(Coords::new(3.0, 3.0));
            orch.form_mut().fill("running", fields[0], fields[1], fields[2]);
            assert!(orch.submit().is_err(), "accepted {:?}", fields);
            assert_eq!(orch.store().len(), 1);
        }
        assert_eq!(saved(&orch).len(), 1);
    }

    #[test]
    fn test_submit_without_open_form() {
        let mut orch = setup();
        assert!(matches!(orch.submit(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_edit_prefills_form_with_stored_fields() {
        let mut orch = setup();
        let id = add(&mut orch, Coords::new(40.7, -74.0), "cycling", ["20", "60", "200"]);

        orch.request_edit(&id.to_string()).unwrap();

        let prefill = orch.form().prefills.last().unwrap().clone();
        assert_eq!(
            prefill,
            FormPrefill {
                kind: WorkoutKind::Cycling,
                distance: 20.0,
                duration: 60.0,
                cadence_or_elevation: 200.0,
            }
        );
        assert_eq!(
            orch.state(),
            FormState::Open(FormMode::Edit {
                target: id,
                coords: Coords::new(40.7, -74.0)
            })
        );
    }

    #[test]
    fn test_edit_replaces_under_new_id_at_same_coords() {
        let mut orch = setup();
        let home = Coords::new(51.5, -0.1);
        let first = add(&mut orch, Coords::new(10.0, 10.0), "cycling", ["8", "30", "5"]);
        let target = add(&mut orch, home, "running", ["5", "25", "178"]);
        let old_marker = orch.marker_for(target).unwrap();

        orch.request_edit(&format!(" {} ", target)).unwrap();
        orch.form_mut().fields.distance = "10".into();
        orch.form_mut().fields.duration = "40".into();

        let (old, new) = match orch.submit().unwrap() {
            Outcome::Replaced { old, new } => (old, new),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(old, target);
        assert_ne!(new, target);

        assert_eq!(orch.store().len(), 2);
        assert!(!orch.store().contains(target));
        let replacement = orch.store().find_by_id(new).unwrap();
        assert_eq!(replacement.distance(), 10.0);
        assert_eq!(replacement.duration(), 40.0);
        assert_eq!(replacement.cadence(), Some(178.0));
        assert_eq!(replacement.pace(), Some(4.0));
        assert_eq!(replacement.coords(), home);

        assert!(!orch.map().live.contains_key(&old_marker));
        assert!(orch.marker_for(new).is_some());
        assert_eq!(orch.map().live.len(), 2);

        let ids: Vec<_> = saved(&orch).iter().map(Workout::id).collect();
        assert_eq!(ids, vec![first, new]);
        assert_eq!(orch.state(), FormState::Idle);
    }

    #[test]
    fn test_edit_can_switch_type() {
        let mut orch = setup();
        let id = add(&mut orch, Coords::new(0.0, 0.0), "running", ["5", "25", "178"]);

        orch.request_edit(&id.to_string()).unwrap();
        orch.on_type_change(WorkoutKind::Cycling);
        orch.form_mut().fields.elevation = "120".into();

        let Outcome::Replaced { new, .. } = orch.submit().unwrap() else {
            panic!("expected replacement");
        };
        let w = orch.store().find_by_id(new).unwrap();
        assert_eq!(w.kind(), WorkoutKind::Cycling);
        assert_eq!(w.elevation(), Some(120.0));
        assert_eq!(w.speed(), Some(5.0 / (25.0 / 60.0)));
        assert_eq!(orch.form().toggles, vec![WorkoutKind::Cycling]);
    }

    #[test]
    fn test_rejected_edit_keeps_original() {
        let mut orch = setup();
        let id = add(&mut orch, Coords::new(0.0, 0.0), "running", ["5", "25", "178"]);
        let original = orch.store().find_by_id(id).unwrap().clone();
        let snapshot = orch.kv().get("workouts").unwrap();

        orch.request_edit(&id.to_string()).unwrap();
        orch.form_mut().fields.cadence = "0".into();
        assert!(orch.submit().is_err());

        assert_eq!(orch.workouts(), &[original]);
        assert_eq!(orch.kv().get("workouts").unwrap(), snapshot);
        assert_eq!(orch.map().live.len(), 1);
        assert!(matches!(
            orch.state(),
            FormState::Open(FormMode::Edit { target, .. }) if target == id
        ));
    }

    #[test]
    fn test_edit_with_vanished_target_keeps_new_entry() {
        let mut orch = setup();
        let id = add(&mut orch, Coords::new(0.0, 0.0), "running", ["5", "25", "178"]);
        orch.request_edit(&id.to_string()).unwrap();

        orch.store.remove_by_id(id).unwrap();

        let Outcome::Created(new) = orch.submit().unwrap() else {
            panic!("expected plain create");
        };
        assert_eq!(orch.store().len(), 1);
        assert!(orch.store().contains(new));
        assert_eq!(saved(&orch).len(), 1);
    }

    #[test]
    fn test_delete_sole_workout_empties_store() {
        let mut orch = setup();
        let id = add(&mut orch, Coords::new(0.0, 0.0), "running", ["5", "25", "178"]);
        assert!(!orch.store().is_empty());

        let outcome = orch.delete(&id.to_string()).unwrap();
        assert_eq!(outcome, Outcome::Deleted { id, now_empty: true });
        assert!(orch.store().is_empty());
        assert!(!orch.clear_all_visible());
        assert!(orch.map().live.is_empty());
        assert_eq!(orch.kv().get("workouts").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_add_two_delete_first() {
        let mut orch = setup();
        let a = add(&mut orch, Coords::new(1.0, 1.0), "running", ["5", "25", "178"]);
        let b = add(&mut orch, Coords::new(2.0, 2.0), "cycling", ["20", "60", "200"]);

        let ids: Vec<_> = orch.workouts().iter().map(Workout::id).collect();
        assert_eq!(ids, vec![a, b]);

        let outcome = orch.delete(&a.to_string()).unwrap();
        assert_eq!(outcome, Outcome::Deleted { id: a, now_empty: false });

        let remaining = orch.workouts().to_vec();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), b);
        assert_eq!(saved(&orch), remaining);
    }

    #[test]
    fn test_delete_unknown_or_malformed_id() {
        let mut orch = setup();
        add(&mut orch, Coords::new(0.0, 0.0), "running", ["5", "25", "178"]);
        let snapshot = orch.kv().get("workouts").unwrap();

        assert!(matches!(orch.delete("12"), Err(Error::NotFound(_))));
        assert!(matches!(orch.delete("not-an-id"), Err(Error::InvalidId(_))));
        assert!(matches!(orch.request_edit("12"), Err(Error::NotFound(_))));

        assert_eq!(orch.store().len(), 1);
        assert_eq!(orch.kv().get("workouts").unwrap(), snapshot);
    }

    #[test]
    fn test_deleting_edit_target_closes_form() {
        let mut orch = setup();
        let id = add(&mut orch, Coords::new(0.0, 0.0), "running", ["5", "25", "178"]);
        orch.request_edit(&id.to_string()).unwrap();

        orch.delete(&id.to_string()).unwrap();
        assert_eq!(orch.state(), FormState::Idle);
        assert!(!orch.form().visible);
    }

    #[test]
    fn test_select_centres_map() {
        let mut orch = setup();
        let coords = Coords::new(48.85, 2.35);
        let id = add(&mut orch, coords, "running", ["5", "25", "178"]);

        assert_eq!(orch.select(&id.to_string()).unwrap(), Outcome::Selected(id));
        assert_eq!(orch.map().views, vec![(coords, 13)]);
    }

    #[test]
    fn test_cancel_closes_form() {
        let mut orch = setup();
        orch.on_map_click(Coords::new(0.0, 0.0));
        assert_eq!(orch.cancel(), Outcome::FormClosed);
        assert_eq!(orch.state(), FormState::Idle);
        assert!(!orch.form().visible);
        assert!(orch.store().is_empty());
    }

    #[test]
    fn test_load_restores_workouts_and_markers() {
        let mut orch = setup();
        let a = add(&mut orch, Coords::new(1.0, 1.0), "running", ["5", "25", "178"]);
        let b = add(&mut orch, Coords::new(2.0, 2.0), "cycling", ["20", "60", "200"]);
        let kv = orch.kv().clone();

        let mut reloaded = Orchestrator::load(
            FakeMap::default(),
            FakeForm::default(),
            kv,
            &Config::default(),
        );

        let ids: Vec<_> = reloaded.workouts().iter().map(Workout::id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(reloaded.map().live.len(), 2);
        assert_eq!(reloaded.workouts()[1].speed(), Some(20.0));
        assert!(reloaded.clear_all_visible());

        let c = add(&mut reloaded, Coords::new(3.0, 3.0), "running", ["1", "6", "160"]);
        assert!(c > b);
    }

    #[test]
    fn test_load_with_corrupt_snapshot_starts_empty() {
        crate::logging::init_test();
        let mut kv = MemoryKeyValueStore::new();
        kv.set("workouts", "{ invalid json }}}}").unwrap();

        let mut orch = Orchestrator::load(
            FakeMap::default(),
            FakeForm::default(),
            kv,
            &Config::default(),
        );
        assert!(orch.store().is_empty());
        assert!(!orch.clear_all_visible());

        add(&mut orch, Coords::new(0.0, 0.0), "running", ["5", "25", "178"]);
        assert_eq!(saved(&orch).len(), 1);
    }

    #[test]
    fn test_load_with_exhausted_id_still_accepts_new_workouts() {
        crate::logging::init_test();
        let snapshot = format!(
            r#"[{{"id":{},"distance":5,"duration":25,"coords":[0,0],
            "type":"running","date":"2023-04-14T08:36:32Z","description":"x",
            "cadence":170,"pace":5}}]"#,
            u64::MAX
        );
        let mut kv = MemoryKeyValueStore::new();
        kv.set("workouts", &snapshot).unwrap();

        let mut orch = Orchestrator::load(
            FakeMap::default(),
            FakeForm::default(),
            kv,
            &Config::default(),
        );
        assert!(orch.store().is_empty());

        let a = add(&mut orch, Coords::new(0.0, 0.0), "running", ["5", "25", "178"]);
        let b = add(&mut orch, Coords::new(1.0, 1.0), "running", ["5", "25", "178"]);
        assert_ne!(a, b);
        assert_eq!(saved(&orch).len(), 2);
    }

    #[test]
    fn test_clear_all() {
        let mut orch = setup();
        add(&mut orch, Coords::new(1.0, 1.0), "running", ["5", "25", "178"]);
        add(&mut orch, Coords::new(2.0, 2.0), "cycling", ["20", "60", "200"]);
        orch.on_map_click(Coords::new(3.0, 3.0));

        assert_eq!(orch.clear_all().unwrap(), Outcome::Cleared { removed: 2 });
        assert!(orch.store().is_empty());
        assert!(orch.map().live.is_empty());
        assert!(orch.kv().is_empty());
        assert_eq!(orch.state(), FormState::Idle);
    }

    #[test]
    fn test_dispatch_routes_events() {
        let mut orch = setup();
        let coords = Coords::new(5.0, 6.0);

        assert_eq!(
            orch.dispatch(Event::MapClick(coords)).unwrap(),
            Outcome::FormOpened
        );
        assert_eq!(
            orch.dispatch(Event::TypeChange(WorkoutKind::Cycling)).unwrap(),
            Outcome::TypeChanged(WorkoutKind::Cycling)
        );
        orch.form_mut().fields.distance = "20".into();
        orch.form_mut().fields.duration = "60".into();
        orch.form_mut().fields.elevation = "0".into();

        let Outcome::Created(id) = orch.dispatch(Event::Submit).unwrap() else {
            panic!("expected create");
        };
        assert_eq!(
            orch.dispatch(Event::Select(id.to_string())).unwrap(),
            Outcome::Selected(id)
        );
        assert_eq!(
            orch.dispatch(Event::Delete(id.to_string())).unwrap(),
            Outcome::Deleted { id, now_empty: true }
        );
        assert_eq!(
            orch.dispatch(Event::ClearAll).unwrap(),
            Outcome::Cleared { removed: 0 }
        );
    }
}
