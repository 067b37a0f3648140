//! The MSB database: programs, lifecycle, queries, and history in one place.
//!
//! Every tree mutation runs under its project's lock: load the stored
//! program, rewrite a private copy, record the event, then store the copy
//! against the loaded timestamp. Different projects never contend. Queries read
//! stored snapshots and take no locks.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use jiff::Timestamp;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    checksum::ChecksumError,
    history::{HistoryError, HistoryStore, MsbHistory, Recorded},
    lifecycle::{self, LifecycleError, Outcome},
    model::{Checksum, EventStatus, MsbSummary, ObservationEvent, TimeWindow},
    program::{ProgramDocument, ProgramError, ProgramTree},
    query::{self, Candidate, ElevationSource, Query, QueryError},
    storage::{EventLog, ProgramStore, StorageError, StoredProgram},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Program(#[from] ProgramError),

    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("MSB {checksum} is not in program {project}")]
    MsbNotFound { project: String, checksum: Checksum },

    #[error("project lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type Result<T> = core::result::Result<T, Error>;

/// Who is recording an event, and what they had to say.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub author: Option<String>,
    pub comment: Option<String>,
}

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// What an MSB operation did.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub event: ObservationEvent,
    pub recorded: Recorded,

    /// The tree change, or `None` for operations that only log an event.
    pub outcome: Option<Outcome>,
}

impl Receipt {
    /// Whether the MSB was absent from the current program.
    pub fn msb_missing(&self) -> bool {
        matches!(self.outcome, Some(Outcome::Missing))
    }
}

/// Result of storing a program.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreReceipt {
    pub project_id: String,
    pub timestamp: Timestamp,
    pub msbs: usize,
    pub active: usize,

    /// Checksums shared by several MSBs, with how many share each.
    pub duplicates: BTreeMap<Checksum, usize>,
}

/// A program's MSBs at a glance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSummary {
    pub project_id: String,
    pub title: Option<String>,
    pub timestamp: Timestamp,
    pub active: usize,
    pub msbs: Vec<MsbSummary>,
}

/// Programs and their observation history.
pub struct MsbDb<P, L> {
    programs: P,
    history: HistoryStore<L>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    default_max_results: usize,
}

impl<P: ProgramStore, L: EventLog> MsbDb<P, L> {
    /// Cap applied to queries that ask for the default number of results.
    pub const DEFAULT_MAX_RESULTS: usize = 100;

    pub fn new(programs: P, log: L) -> Self {
        Self {
            programs,
            history: HistoryStore::new(log),
            locks: Mutex::new(HashMap::new()),
            default_max_results: Self::DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_default_max_results(mut self, max: usize) -> Self {
        self.default_max_results = max;
        self
    }

    pub fn programs(&self) -> &P {
        &self.programs
    }

    pub fn history_store(&self) -> &HistoryStore<L> {
        &self.history
    }

    /// Runs `f` holding the project's single-writer lock.
    fn with_project_lock<T>(&self, project: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| Error::LockPoisoned(project.to_string()))?;
            Arc::clone(locks.entry(project.to_string()).or_default())
        };
        let _guard = lock
            .lock()
            .map_err(|_| Error::LockPoisoned(project.to_string()))?;
        f()
    }

    // ── Programs ──

    /// Validates and stores a program, replacing any earlier version.
    pub fn store_program(
        &self,
        doc: &ProgramDocument,
        expected: Option<Timestamp>,
        force: bool,
    ) -> Result<StoreReceipt> {
        let tree = ProgramTree::from_document(doc)?;
        let project = tree.project_id().to_string();

        let duplicates: BTreeMap<Checksum, usize> = tree
            .duplicate_checksums()
            .into_iter()
            .map(|(checksum, nodes)| (checksum, nodes.len()))
            .collect();
        for (checksum, count) in &duplicates {
            warn!(%project, %checksum, count, "MSBs share a checksum; the first is used for lookups");
        }

        let timestamp =
            self.with_project_lock(&project, || Ok(self.programs.store(&tree, expected, force)?))?;
        info!(%project, %timestamp, msbs = tree.msbs().len(), "program accepted");

        Ok(StoreReceipt {
            project_id: project,
            timestamp,
            msbs: tree.msbs().len(),
            active: tree.active_count(),
            duplicates,
        })
    }

    pub fn load_program(&self, project: &str) -> Result<StoredProgram> {
        Ok(self.programs.load(project)?)
    }

    pub fn projects(&self) -> Result<Vec<String>> {
        Ok(self.programs.projects()?)
    }

    /// Every MSB in a program with its state.
    pub fn summary(&self, project: &str) -> Result<ProgramSummary> {
        let stored = self.programs.load(project)?;
        Ok(ProgramSummary {
            project_id: project.to_string(),
            title: stored.tree.title().map(str::to_string),
            timestamp: stored.timestamp,
            active: stored.tree.active_count(),
            msbs: stored.tree.summaries(),
        })
    }

    // ── MSB operations ──

    /// Hands an MSB out for observation, logging a Fetch placeholder.
    pub fn fetch_msb(&self, project: &str, checksum: &Checksum) -> Result<(MsbSummary, Recorded)> {
        let stored = self.programs.load(project)?;
        let Some(node) = stored.tree.find_msb(checksum) else {
            return Err(Error::MsbNotFound {
                project: project.to_string(),
                checksum: checksum.clone(),
            });
        };
        let summary = stored.tree.summary(node)?;
        let event = ObservationEvent::for_msb(&summary, EventStatus::Fetch, Timestamp::now());
        let recorded = self.history.record(&event)?;
        Ok((summary, recorded))
    }

    /// Marks one observation of an MSB as done.
    ///
    /// If the MSB is no longer in the program the tree is left alone, but
    /// the event is still logged with the newest metadata known for it.
    pub fn done(&self, project: &str, checksum: &Checksum, note: &Annotation) -> Result<Receipt> {
        self.mutate(project, checksum, EventStatus::Done, note, lifecycle::observe)
    }

    /// Withdraws an MSB from scheduling without observing it.
    pub fn remove(&self, project: &str, checksum: &Checksum, note: &Annotation) -> Result<Receipt> {
        self.mutate(project, checksum, EventStatus::AllDone, note, lifecycle::remove)
    }

    /// Reverses one observation of an MSB.
    pub fn undo(&self, project: &str, checksum: &Checksum, note: &Annotation) -> Result<Receipt> {
        self.mutate(project, checksum, EventStatus::Undone, note, lifecycle::undo)
    }

    /// Records that an observation of an MSB stopped at `label`.
    pub fn suspend(
        &self,
        project: &str,
        checksum: &Checksum,
        label: &str,
        note: &Annotation,
    ) -> Result<Receipt> {
        self.mutate(project, checksum, EventStatus::Suspended, note, |tree, c| {
            lifecycle::suspend(tree, c, label)
        })
    }

    pub fn reject(&self, project: &str, checksum: &Checksum, note: &Annotation) -> Result<Receipt> {
        self.annotate(project, checksum, EventStatus::Rejected, note)
    }

    pub fn abort(&self, project: &str, checksum: &Checksum, note: &Annotation) -> Result<Receipt> {
        self.annotate(project, checksum, EventStatus::Aborted, note)
    }

    pub fn comment(&self, project: &str, checksum: &Checksum, note: &Annotation) -> Result<Receipt> {
        self.annotate(project, checksum, EventStatus::Comment, note)
    }

    fn mutate(
        &self,
        project: &str,
        checksum: &Checksum,
        status: EventStatus,
        note: &Annotation,
        op: impl FnOnce(&mut ProgramTree, &Checksum) -> lifecycle::Result<Outcome>,
    ) -> Result<Receipt> {
        self.with_project_lock(project, || {
            let stored = self.programs.load(project)?;
            let mut tree = ProgramTree::clone(&stored.tree);
            let summary = tree.find_msb(checksum).map(|n| tree.summary(n)).transpose()?;

            let outcome = op(&mut tree, checksum)?;
            if outcome == Outcome::Missing {
                warn!(project, %checksum, %status, "MSB not in current program; logging event only");
            }

            // The event goes first: a failed append must leave the stored
            // program as it was.
            let event = self.event_for(project, checksum, status, summary.as_ref(), note)?;
            let recorded = self.history.record(&event)?;

            if let Outcome::Applied(transition) = &outcome
                && !transition.is_noop()
            {
                self.programs.store(&tree, Some(stored.timestamp), false)?;
            }
            Ok(Receipt {
                event,
                recorded,
                outcome: Some(outcome),
            })
        })
    }

    fn annotate(
        &self,
        project: &str,
        checksum: &Checksum,
        status: EventStatus,
        note: &Annotation,
    ) -> Result<Receipt> {
        let summary = match self.programs.load(project) {
            Ok(stored) => stored
                .tree
                .find_msb(checksum)
                .map(|n| stored.tree.summary(n))
                .transpose()?,
            Err(StorageError::UnknownProject(_)) => None,
            Err(e) => return Err(e.into()),
        };
        let event = self.event_for(project, checksum, status, summary.as_ref(), note)?;
        let recorded = self.history.record(&event)?;
        info!(project, %checksum, %status, "event recorded");
        Ok(Receipt {
            event,
            recorded,
            outcome: None,
        })
    }

    /// Builds an event, taking metadata from the MSB or else from its history.
    fn event_for(
        &self,
        project: &str,
        checksum: &Checksum,
        status: EventStatus,
        summary: Option<&MsbSummary>,
        note: &Annotation,
    ) -> Result<ObservationEvent> {
        let mut event = ObservationEvent::new(checksum.clone(), project, status, Timestamp::now());
        if let Some(summary) = summary {
            event = event.with_metadata_from(summary);
        } else if let Some(known) = self.history.latest_metadata(checksum)? {
            event = event.with_metadata_of(&known);
        }
        Ok(event
            .with_author(note.author.clone())
            .with_comment(note.comment.clone()))
    }

    // ── Queries ──

    /// Finds observable MSBs across the stored programs.
    pub fn query(&self, query: &Query, elevation: &dyn ElevationSource) -> Result<Vec<Candidate>> {
        query.validate()?;
        let projects: Vec<String> = if query.projects.is_empty() {
            self.programs.projects()?
        } else {
            query.projects.iter().cloned().collect()
        };

        let mut snapshots = Vec::with_capacity(projects.len());
        for project in &projects {
            match self.programs.load(project) {
                Ok(stored) => snapshots.push(stored.tree),
                Err(StorageError::UnknownProject(_)) => {
                    warn!(%project, "no program stored; skipping in query");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(query::find_all(
            snapshots.iter().map(AsRef::as_ref),
            query,
            elevation,
            self.default_max_results,
        )?)
    }

    // ── History ──

    pub fn history(&self, checksum: &Checksum) -> Result<MsbHistory> {
        Ok(self.history.history(checksum)?)
    }

    pub fn project_history(
        &self,
        project: &str,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<MsbHistory>> {
        Ok(self.history.project_history(project, window)?)
    }

    pub fn observed_between(&self, window: &TimeWindow) -> Result<Vec<MsbHistory>> {
        Ok(self.history.observed_between(window)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{sync::mpsc, thread, time::Duration};

    use jiff::ToSpan;
    use tempfile::TempDir;

    use crate::{
        model::{Component, MsbState, Range, Remaining, SiteQuality},
        program::{
            DocNode,
            tests::{instrument, sample_document, target},
        },
        query::NoEphemeris,
        storage::{AppendPolicy, MemoryEventLog, MemoryProgramStore, Storage},
    };

    /// An event log whose appends always fail.
    struct UnavailableLog;

    impl EventLog for UnavailableLog {
        fn append(&self, _: &ObservationEvent, _: AppendPolicy) -> crate::storage::Result<bool> {
            Err(StorageError::Corrupt("log unavailable".to_string()))
        }

        fn for_checksum(&self, _: &Checksum) -> crate::storage::Result<Vec<ObservationEvent>> {
            Ok(Vec::new())
        }

        fn for_project(
            &self,
            _: &str,
            _: Option<&TimeWindow>,
        ) -> crate::storage::Result<Vec<ObservationEvent>> {
            Ok(Vec::new())
        }

        fn between(&self, _: &TimeWindow) -> crate::storage::Result<Vec<ObservationEvent>> {
            Ok(Vec::new())
        }
    }

    type MemoryDb = MsbDb<MemoryProgramStore, MemoryEventLog>;

    fn memory_db() -> MemoryDb {
        MsbDb::new(MemoryProgramStore::new(), MemoryEventLog::new())
    }

    fn loaded() -> MemoryDb {
        let db = memory_db();
        db.store_program(&sample_document(), None, false).unwrap();
        db
    }

    fn checksum_of(db: &MemoryDb, title: &str) -> Checksum {
        db.summary("M01BU01")
            .unwrap()
            .msbs
            .into_iter()
            .find(|m| m.title == title)
            .unwrap()
            .checksum
    }

    fn msb_state(db: &MemoryDb, title: &str) -> (Remaining, MsbState) {
        let msb = db
            .summary("M01BU01")
            .unwrap()
            .msbs
            .into_iter()
            .find(|m| m.title == title)
            .unwrap();
        (msb.remaining, msb.state())
    }

    #[test]
    fn store_program_reports_counts() {
        let db = memory_db();
        let receipt = db.store_program(&sample_document(), None, false).unwrap();

        assert_eq!(receipt.project_id, "M01BU01");
        assert_eq!(receipt.msbs, 3);
        assert_eq!(receipt.active, 3);
        assert!(receipt.duplicates.is_empty());
        assert_eq!(db.projects().unwrap(), vec!["M01BU01"]);
    }

    #[test]
    fn invalid_program_is_rejected() {
        let db = memory_db();
        let doc = ProgramDocument::new("M01")
            .with_child(DocNode::or(vec![DocNode::component(target("Orion"))]));
        let err = db.store_program(&doc, None, false).unwrap_err();
        assert!(matches!(err, Error::Program(ProgramError::InvalidStructure { .. })));
    }

    #[test]
    fn done_decrements_and_logs() {
        let db = loaded();
        let plain = checksum_of(&db, "Plain");

        let receipt = db
            .done("M01BU01", &plain, &Annotation::new().by("obs1").with_comment("clear sky"))
            .unwrap();

        assert_eq!(msb_state(&db, "Plain"), (Remaining::Count(1), MsbState::Eligible));
        assert_eq!(receipt.recorded, Recorded::Appended);
        assert_eq!(receipt.event.author.as_deref(), Some("obs1"));
        assert_eq!(receipt.event.target.as_deref(), Some("Orion"));

        let history = db.history(&plain).unwrap();
        assert_eq!(history.times_observed(), 1);
        assert_eq!(history.events[0].comment.as_deref(), Some("clear sky"));
    }

    #[test]
    fn done_in_or_folder_relocates_and_persists() {
        let db = loaded();
        let alt_a = checksum_of(&db, "Alt A");

        let receipt = db.done("M01BU01", &alt_a, &Annotation::new()).unwrap();

        assert!(matches!(&receipt.outcome, Some(Outcome::Applied(t)) if t.relocated().is_some()));
        let stored = db.load_program("M01BU01").unwrap();
        let node = stored.tree.find_msb(&alt_a).unwrap();
        assert_eq!(stored.tree.nearest_or(node), None);
        assert_eq!(msb_state(&db, "Alt A").1, MsbState::Exhausted);
    }

    #[test]
    fn done_for_missing_msb_still_logs_with_known_metadata() {
        let db = loaded();
        let plain = checksum_of(&db, "Plain");
        db.fetch_msb("M01BU01", &plain).unwrap();

        // Resubmit without the MSB.
        let mut doc = sample_document();
        doc.children.remove(1);
        let current = db.load_program("M01BU01").unwrap().timestamp;
        db.store_program(&doc, Some(current), false).unwrap();
        let before = db.load_program("M01BU01").unwrap();

        let receipt = db.done("M01BU01", &plain, &Annotation::new()).unwrap();

        assert!(receipt.msb_missing());
        assert_eq!(receipt.event.target.as_deref(), Some("Orion"));
        assert_eq!(receipt.event.instrument.as_deref(), Some("SCUBA-2"));
        assert_eq!(db.load_program("M01BU01").unwrap().timestamp, before.timestamp);
        assert_eq!(db.history(&plain).unwrap().times_observed(), 1);
    }

    #[test]
    fn fetch_logs_one_placeholder() {
        let db = loaded();
        let plain = checksum_of(&db, "Plain");

        let (summary, first) = db.fetch_msb("M01BU01", &plain).unwrap();
        let (_, second) = db.fetch_msb("M01BU01", &plain).unwrap();

        assert_eq!(summary.title, "Plain");
        assert_eq!(first, Recorded::Appended);
        assert_eq!(second, Recorded::DuplicateFetch);
        let history = db.history(&plain).unwrap();
        assert!(history.is_placeholder());
        assert_eq!(history.title.as_deref(), Some("Plain"));
    }

    #[test]
    fn fetch_unknown_msb_fails() {
        let db = loaded();
        let err = db
            .fetch_msb("M01BU01", &Checksum::from("00000000000000000000000000000000"))
            .unwrap_err();
        assert!(matches!(err, Error::MsbNotFound { .. }));
    }

    #[test]
    fn remove_then_undo_reinstates() {
        let db = loaded();
        let plain = checksum_of(&db, "Plain");

        let removed = db.remove("M01BU01", &plain, &Annotation::new()).unwrap();
        assert_eq!(removed.event.status, EventStatus::AllDone);
        assert_eq!(msb_state(&db, "Plain").1, MsbState::Removed);

        db.undo("M01BU01", &plain, &Annotation::new()).unwrap();
        assert_eq!(msb_state(&db, "Plain"), (Remaining::Count(1), MsbState::Eligible));

        let statuses: Vec<EventStatus> = db
            .history(&plain)
            .unwrap()
            .events
            .iter()
            .map(|e| e.status)
            .collect();
        assert_eq!(statuses, vec![EventStatus::AllDone, EventStatus::Undone]);
    }

    #[test]
    fn suspend_sets_label() {
        let db = loaded();
        let plain = checksum_of(&db, "Plain");

        db.suspend("M01BU01", &plain, "obs-2", &Annotation::new()).unwrap();

        let summary = db.summary("M01BU01").unwrap();
        let msb = summary.msbs.iter().find(|m| m.title == "Plain").unwrap();
        assert_eq!(msb.suspended.as_deref(), Some("obs-2"));
    }

    #[test]
    fn event_only_operations_leave_program_alone() {
        let db = loaded();
        let plain = checksum_of(&db, "Plain");
        let before = db.load_program("M01BU01").unwrap().timestamp;

        db.reject("M01BU01", &plain, &Annotation::new().with_comment("too windy"))
            .unwrap();
        db.abort("M01BU01", &plain, &Annotation::new()).unwrap();
        let receipt = db.comment("M01BU01", &plain, &Annotation::new()).unwrap();

        assert!(receipt.outcome.is_none());
        assert_eq!(db.load_program("M01BU01").unwrap().timestamp, before);
        assert_eq!(db.history(&plain).unwrap().events.len(), 3);
    }

    #[test]
    fn query_spans_projects() {
        let db = loaded();
        let other = ProgramDocument::new("U02").with_child(
            DocNode::msb("Wet weather", 1)
                .with_child(DocNode::component(instrument("HARP")))
                .with_child(DocNode::component(Component::SiteQuality(SiteQuality {
                    tau: Range::new(0.2, 0.3),
                    ..SiteQuality::default()
                }))),
        );
        db.store_program(&other, None, false).unwrap();

        let all = db.query(&Query::new(), &NoEphemeris).unwrap();
        assert_eq!(all.len(), 4);

        let dry = db.query(&Query::new().at_tau(0.05), &NoEphemeris).unwrap();
        assert!(dry.iter().all(|c| c.msb.project_id == "M01BU01"));

        let only = db
            .query(&Query::new().with_project("U02"), &NoEphemeris)
            .unwrap();
        assert_eq!(only.len(), 1);
    }

    #[test]
    fn default_cap_comes_from_db() {
        let db = loaded().with_default_max_results(2);
        assert_eq!(db.query(&Query::new(), &NoEphemeris).unwrap().len(), 2);
        assert_eq!(
            db.query(&Query::new().with_max_results(-1), &NoEphemeris)
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn concurrent_observations_are_serialized() {
        let db = Arc::new(memory_db());
        let doc = ProgramDocument::new("M01")
            .with_child(DocNode::msb("Many", 20).with_child(DocNode::component(target("Orion"))));
        db.store_program(&doc, None, false).unwrap();
        let checksum = db.summary("M01").unwrap().msbs[0].checksum.clone();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = Arc::clone(&db);
                let checksum = checksum.clone();
                thread::spawn(move || db.done("M01", &checksum, &Annotation::new()).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let msb = &db.summary("M01").unwrap().msbs[0];
        assert_eq!(msb.remaining, Remaining::Count(12));
        assert_eq!(db.history(&checksum).unwrap().times_observed(), 8);
    }

    #[test]
    fn failed_append_leaves_program_unchanged() {
        let db = MsbDb::new(MemoryProgramStore::new(), UnavailableLog);
        db.store_program(&sample_document(), None, false).unwrap();
        let before = db.load_program("M01BU01").unwrap();
        let summary = db.summary("M01BU01").unwrap();

        for title in ["Plain", "Alt A"] {
            let checksum = &summary.msbs.iter().find(|m| m.title == title).unwrap().checksum;
            let err = db.done("M01BU01", checksum, &Annotation::new()).unwrap_err();
            assert!(matches!(
                err,
                Error::History(HistoryError::Storage(StorageError::Corrupt(_)))
            ));
        }
        let err = db
            .remove("M01BU01", &summary.msbs[0].checksum, &Annotation::new())
            .unwrap_err();
        assert!(matches!(err, Error::History(HistoryError::Storage(_))));

        let after = db.load_program("M01BU01").unwrap();
        assert_eq!(after.timestamp, before.timestamp);
        assert_eq!(after.tree.to_document(), before.tree.to_document());
    }

    #[test]
    fn different_projects_do_not_wait_for_each_other() {
        let db = loaded();
        let other = ProgramDocument::new("U02")
            .with_child(DocNode::msb("Other", 3).with_child(DocNode::component(target("Vega"))));
        db.store_program(&other, None, false).unwrap();
        let other_checksum = db.summary("U02").unwrap().msbs[0].checksum.clone();
        let plain = checksum_of(&db, "Plain");
        let db = &db;

        thread::scope(|s| {
            let (tx, rx) = mpsc::channel();
            db.with_project_lock("M01BU01", || {
                let other_tx = tx.clone();
                let other_checksum = other_checksum.clone();
                s.spawn(move || {
                    db.done("U02", &other_checksum, &Annotation::new()).unwrap();
                    other_tx.send("U02").unwrap();
                });
                assert_eq!(rx.recv_timeout(Duration::from_secs(10)), Ok("U02"));

                let same_tx = tx.clone();
                let plain = plain.clone();
                s.spawn(move || {
                    db.done("M01BU01", &plain, &Annotation::new()).unwrap();
                    same_tx.send("M01BU01").unwrap();
                });
                assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
                Ok(())
            })
            .unwrap();
            assert_eq!(rx.recv_timeout(Duration::from_secs(10)), Ok("M01BU01"));
        });

        assert_eq!(db.summary("U02").unwrap().msbs[0].remaining, Remaining::Count(2));
        assert_eq!(msb_state(db, "Plain").0, Remaining::Count(1));
    }

    #[test]
    fn sqlite_backed_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        let db = MsbDb::new(storage.clone(), storage);
        db.store_program(&sample_document(), None, false).unwrap();

        let alt_b = db
            .summary("M01BU01")
            .unwrap()
            .msbs
            .into_iter()
            .find(|m| m.title == "Alt B")
            .unwrap()
            .checksum;
        db.done("M01BU01", &alt_b, &Annotation::new().by("obs2")).unwrap();

        let summary = db.summary("M01BU01").unwrap();
        assert_eq!(summary.active, 2);
        let tonight = TimeWindow::new(Timestamp::now() - 1.hour(), Timestamp::now() + 1.hour());
        let observed = db.observed_between(&tonight).unwrap();
        assert_eq!(observed.len(), 1);
        assert_eq!(observed[0].events[0].author.as_deref(), Some("obs2"));
        assert_eq!(db.project_history("M01BU01", None).unwrap().len(), 1);
    }
}
