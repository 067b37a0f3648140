//! Event storage: the `msb_done` table.

use rusqlite::{Connection, Row, TransactionBehavior};
use tracing::debug;

use crate::model::{Checksum, EventStatus, ObservationEvent, TimeWindow};

use super::{AppendPolicy, EventLog, Result, Storage, StorageError, from_epoch_ns, to_epoch_ns};

const COLUMNS: &str =
    "checksum, project_id, epoch_ns, status, comment, author, title, target, instrument, waveband";

impl EventLog for Storage {
    fn append(&self, event: &ObservationEvent, policy: AppendPolicy) -> Result<bool> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if policy == AppendPolicy::IfFirstForMsb {
            let existing: i64 = tx.query_row(
                "SELECT COUNT(*) FROM msb_done WHERE checksum = ?1 AND project_id = ?2",
                rusqlite::params![event.checksum.as_str(), &event.project_id],
                |row| row.get(0),
            )?;
            if existing > 0 {
                debug!(
                    project = %event.project_id,
                    checksum = %event.checksum,
                    status = %event.status,
                    "event dropped: MSB already has history"
                );
                return Ok(false);
            }
        }

        tx.execute(
            &format!(
                "INSERT INTO msb_done ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            rusqlite::params![
                event.checksum.as_str(),
                &event.project_id,
                to_epoch_ns(event.timestamp)?,
                event.status.as_str(),
                &event.comment,
                &event.author,
                &event.title,
                &event.target,
                &event.instrument,
                &event.waveband,
            ],
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn for_checksum(&self, checksum: &Checksum) -> Result<Vec<ObservationEvent>> {
        let conn = self.open_db()?;
        select(
            &conn,
            "WHERE checksum = ?1",
            rusqlite::params![checksum.as_str()],
        )
    }

    fn for_project(
        &self,
        project: &str,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<ObservationEvent>> {
        let conn = self.open_db()?;
        match window {
            Some(w) => select(
                &conn,
                "WHERE project_id = ?1 AND epoch_ns >= ?2 AND epoch_ns < ?3",
                rusqlite::params![project, to_epoch_ns(w.start)?, to_epoch_ns(w.end)?],
            ),
            None => select(&conn, "WHERE project_id = ?1", rusqlite::params![project]),
        }
    }

    fn between(&self, window: &TimeWindow) -> Result<Vec<ObservationEvent>> {
        let conn = self.open_db()?;
        select(
            &conn,
            "WHERE epoch_ns >= ?1 AND epoch_ns < ?2",
            rusqlite::params![to_epoch_ns(window.start)?, to_epoch_ns(window.end)?],
        )
    }
}

/// Loads events matching `filter`, oldest first.
fn select(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<ObservationEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM msb_done {filter} ORDER BY epoch_ns, id"
    ))?;
    let rows = stmt
        .query_map(params, RawEvent::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(RawEvent::into_event).collect()
}

/// Column values before timestamp and status are parsed.
struct RawEvent {
    checksum: String,
    project_id: String,
    epoch_ns: i64,
    status: String,
    comment: Option<String>,
    author: Option<String>,
    title: Option<String>,
    target: Option<String>,
    instrument: Option<String>,
    waveband: Option<String>,
}

impl RawEvent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            checksum: row.get(0)?,
            project_id: row.get(1)?,
            epoch_ns: row.get(2)?,
            status: row.get(3)?,
            comment: row.get(4)?,
            author: row.get(5)?,
            title: row.get(6)?,
            target: row.get(7)?,
            instrument: row.get(8)?,
            waveband: row.get(9)?,
        })
    }

    fn into_event(self) -> Result<ObservationEvent> {
        let status = self
            .status
            .parse::<EventStatus>()
            .map_err(StorageError::Corrupt)?;
        Ok(ObservationEvent {
            checksum: Checksum::from(self.checksum),
            project_id: self.project_id,
            timestamp: from_epoch_ns(self.epoch_ns)?,
            status,
            comment: self.comment,
            author: self.author,
            title: self.title,
            target: self.target,
            instrument: self.instrument,
            waveband: self.waveband,
        })
    }
}
