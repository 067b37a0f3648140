//! Persistence for science programs and the observation event log.
//!
//! Two collaborator traits are defined here: [`ProgramStore`] for whole
//! program trees with optimistic concurrency, and [`EventLog`] for the
//! append-only done table. [`Storage`] implements both on one `SQLite` file:
//!
//! ```text
//! <root>/msbdb.sqlite
//!   program   # one row per project: zstd-compressed JSON document + timestamp
//!   msb_done  # append-only observation events
//! ```
//!
//! [`MemoryProgramStore`] and [`MemoryEventLog`] keep everything in process.

mod events;
mod memory;
mod program;

use std::{io, path::PathBuf, sync::Arc};

use jiff::Timestamp;
use rusqlite::Connection;

use crate::{
    model::{Checksum, ObservationEvent, TimeWindow},
    program::ProgramTree,
};

pub use memory::{MemoryEventLog, MemoryProgramStore};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(
        "program {project} changed since it was loaded (stored {stored}, expected {})",
        .expected.map_or_else(|| "none".to_string(), |t| t.to_string())
    )]
    StaleProgram {
        project: String,
        stored: Timestamp,
        expected: Option<Timestamp>,
    },

    #[error("unknown project: {0}")]
    UnknownProject(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("storage lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// A program as last stored, with the timestamp that identifies that version.
#[derive(Debug, Clone)]
pub struct StoredProgram {
    pub tree: Arc<ProgramTree>,
    pub timestamp: Timestamp,
}

/// Whole-program persistence keyed by project id.
pub trait ProgramStore {
    /// Loads the current version of a project's program.
    fn load(&self, project: &str) -> Result<StoredProgram>;

    /// Stores `tree` as the project's new version and returns its timestamp.
    ///
    /// `expected` is the timestamp the caller loaded. The store fails with
    /// [`StorageError::StaleProgram`] if a newer version exists, or if a
    /// version exists and `expected` is `None`, unless `force` is set.
    /// Timestamps strictly increase per project.
    fn store(
        &self,
        tree: &ProgramTree,
        expected: Option<Timestamp>,
        force: bool,
    ) -> Result<Timestamp>;

    /// Every project with a stored program, sorted.
    fn projects(&self) -> Result<Vec<String>>;
}

/// How [`EventLog::append`] treats existing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendPolicy {
    Always,

    /// Append only if no event exists yet for the same checksum and project.
    /// The check and the append are one atomic step.
    IfFirstForMsb,
}

/// The append-only observation event log.
///
/// Query methods return events in timestamp order, ties in append order.
pub trait EventLog {
    /// Appends `event`. Returns `false` when the policy dropped it.
    fn append(&self, event: &ObservationEvent, policy: AppendPolicy) -> Result<bool>;

    fn for_checksum(&self, checksum: &Checksum) -> Result<Vec<ObservationEvent>>;

    /// A project's events, optionally limited to a time window.
    fn for_project(
        &self,
        project: &str,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<ObservationEvent>>;

    /// All events within a time window.
    fn between(&self, window: &TimeWindow) -> Result<Vec<ObservationEvent>>;
}

/// Checks optimistic concurrency and picks the timestamp for a new version.
fn next_version(
    project: &str,
    stored: Option<Timestamp>,
    expected: Option<Timestamp>,
    force: bool,
) -> Result<Timestamp> {
    let now = Timestamp::now();
    let Some(stored) = stored else {
        return Ok(now);
    };
    if !force && expected.is_none_or(|e| stored > e) {
        return Err(StorageError::StaleProgram {
            project: project.to_string(),
            stored,
            expected,
        });
    }
    if now > stored {
        return Ok(now);
    }
    stored
        .checked_add(jiff::SignedDuration::from_nanos(1))
        .map_err(|e| StorageError::Corrupt(format!("timestamp overflow: {e}")))
}

// ── SQLite ──

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS program (
        project_id TEXT PRIMARY KEY,
        epoch_ns   INTEGER NOT NULL,
        document   BLOB NOT NULL
    );
    CREATE TABLE IF NOT EXISTS msb_done (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        checksum   TEXT NOT NULL,
        project_id TEXT NOT NULL,
        epoch_ns   INTEGER NOT NULL,
        status     TEXT NOT NULL,
        comment    TEXT,
        author     TEXT,
        title      TEXT,
        target     TEXT,
        instrument TEXT,
        waveband   TEXT
    );
    CREATE INDEX IF NOT EXISTS msb_done_checksum ON msb_done (checksum, project_id);
    CREATE INDEX IF NOT EXISTS msb_done_project ON msb_done (project_id, epoch_ns);
    CREATE INDEX IF NOT EXISTS msb_done_time ON msb_done (epoch_ns);
";

/// `SQLite`-backed storage for programs and events.
///
/// Each operation opens its own connection, so a `Storage` can be cloned
/// and shared freely; `SQLite` serializes the writers.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory and database are created if they don't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let storage = Self { root };
        storage.open_db()?;
        Ok(storage)
    }

    /// Returns the default storage root: `~/.msbdb/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".msbdb"))
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("msbdb.sqlite")
    }

    /// Opens a connection, creating the schema on first use.
    fn open_db(&self) -> Result<Connection> {
        let conn = Connection::open(self.db_path())?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }
}

/// Timestamps are stored as nanoseconds since the Unix epoch.
fn to_epoch_ns(at: Timestamp) -> Result<i64> {
    i64::try_from(at.as_nanosecond())
        .map_err(|_| StorageError::Corrupt(format!("timestamp out of range: {at}")))
}

fn from_epoch_ns(ns: i64) -> Result<Timestamp> {
    Timestamp::from_nanosecond(i128::from(ns))
        .map_err(|e| StorageError::Corrupt(format!("invalid timestamp {ns}: {e}")))
}
