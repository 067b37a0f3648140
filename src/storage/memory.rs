//! In-process storage backends.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use jiff::Timestamp;

use crate::{
    model::{Checksum, ObservationEvent, TimeWindow},
    program::ProgramTree,
};

use super::{
    AppendPolicy, EventLog, ProgramStore, Result, StorageError, StoredProgram, next_version,
};

/// Programs held as shared snapshots, keyed by project.
#[derive(Debug, Default)]
pub struct MemoryProgramStore {
    programs: RwLock<BTreeMap<String, StoredProgram>>,
}

impl MemoryProgramStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgramStore for MemoryProgramStore {
    fn load(&self, project: &str) -> Result<StoredProgram> {
        let programs = self.programs.read().map_err(|_| StorageError::LockPoisoned)?;
        programs
            .get(project)
            .cloned()
            .ok_or_else(|| StorageError::UnknownProject(project.to_string()))
    }

    fn store(
        &self,
        tree: &ProgramTree,
        expected: Option<Timestamp>,
        force: bool,
    ) -> Result<Timestamp> {
        let mut programs = self.programs.write().map_err(|_| StorageError::LockPoisoned)?;
        let project = tree.project_id();
        let stored = programs.get(project).map(|p| p.timestamp);
        let timestamp = next_version(project, stored, expected, force)?;
        programs.insert(
            project.to_string(),
            StoredProgram {
                tree: Arc::new(tree.clone()),
                timestamp,
            },
        );
        Ok(timestamp)
    }

    fn projects(&self) -> Result<Vec<String>> {
        let programs = self.programs.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(programs.keys().cloned().collect())
    }
}

/// An append-only event list.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: RwLock<Vec<ObservationEvent>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn matching(&self, keep: impl Fn(&ObservationEvent) -> bool) -> Result<Vec<ObservationEvent>> {
        let events = self.events.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut found: Vec<ObservationEvent> = events.iter().filter(|e| keep(e)).cloned().collect();
        found.sort_by_key(|e| e.timestamp);
        Ok(found)
    }
}

impl EventLog for MemoryEventLog {
    fn append(&self, event: &ObservationEvent, policy: AppendPolicy) -> Result<bool> {
        let mut events = self.events.write().map_err(|_| StorageError::LockPoisoned)?;
        if policy == AppendPolicy::IfFirstForMsb
            && events
                .iter()
                .any(|e| e.checksum == event.checksum && e.project_id == event.project_id)
        {
            return Ok(false);
        }
        events.push(event.clone());
        Ok(true)
    }

    fn for_checksum(&self, checksum: &Checksum) -> Result<Vec<ObservationEvent>> {
        self.matching(|e| &e.checksum == checksum)
    }

    fn for_project(
        &self,
        project: &str,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<ObservationEvent>> {
        self.matching(|e| e.project_id == project && window.is_none_or(|w| w.contains(e.timestamp)))
    }

    fn between(&self, window: &TimeWindow) -> Result<Vec<ObservationEvent>> {
        self.matching(|e| window.contains(e.timestamp))
    }
}
