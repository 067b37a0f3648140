//! Observation history: the done table as per-MSB histories.
//!
//! The log only ever grows. What a reader sees is derived on request by
//! [`reconcile`]: events grouped by checksum, in time order, with Fetch
//! placeholders hidden as soon as anything substantive exists.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::{
    model::{Checksum, EventStatus, ObservationEvent, TimeWindow},
    storage::{AppendPolicy, EventLog, StorageError},
};

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("no history for MSB {0}")]
    UnknownMsb(Checksum),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = core::result::Result<T, HistoryError>;

/// The visible history of one MSB.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MsbHistory {
    pub checksum: Checksum,
    pub project_id: String,

    /// Metadata from the newest event that carried any, placeholders included.
    pub title: Option<String>,
    pub target: Option<String>,
    pub instrument: Option<String>,
    pub waveband: Option<String>,

    /// Visible events, oldest first.
    pub events: Vec<ObservationEvent>,
}

impl MsbHistory {
    /// Number of recorded observations.
    pub fn times_observed(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.status == EventStatus::Done)
            .count()
    }

    pub fn last_status(&self) -> Option<EventStatus> {
        self.events.last().map(|e| e.status)
    }

    /// Whether only the Fetch placeholder has been recorded.
    pub fn is_placeholder(&self) -> bool {
        self.events.iter().all(|e| e.status.is_placeholder())
    }

    fn last_activity(&self) -> Option<jiff::Timestamp> {
        self.events.last().map(|e| e.timestamp)
    }
}

/// Derives the visible history of `checksum` from raw events.
///
/// Events for other checksums are ignored. Returns `None` when there are
/// no events for `checksum` at all.
pub fn reconcile(
    checksum: &Checksum,
    events: impl IntoIterator<Item = ObservationEvent>,
) -> Option<MsbHistory> {
    let mut events: Vec<ObservationEvent> = events
        .into_iter()
        .filter(|e| &e.checksum == checksum)
        .collect();
    if events.is_empty() {
        return None;
    }
    events.sort_by_key(|e| e.timestamp);

    let newest = events.last()?;
    let project_id = newest.project_id.clone();
    let metadata = events.iter().rev().find(|e| e.has_metadata()).unwrap_or(newest);
    let (title, target, instrument, waveband) = (
        metadata.title.clone(),
        metadata.target.clone(),
        metadata.instrument.clone(),
        metadata.waveband.clone(),
    );

    if events.iter().any(|e| !e.status.is_placeholder()) {
        events.retain(|e| !e.status.is_placeholder());
    } else {
        // Only placeholders: keep the first as the single visible entry.
        events.truncate(1);
    }

    Some(MsbHistory {
        checksum: checksum.clone(),
        project_id,
        title,
        target,
        instrument,
        waveband,
        events,
    })
}

/// Derives a history per checksum, ordered by most recent activity.
pub fn reconcile_all(events: impl IntoIterator<Item = ObservationEvent>) -> Vec<MsbHistory> {
    let mut grouped: BTreeMap<Checksum, Vec<ObservationEvent>> = BTreeMap::new();
    for event in events {
        grouped.entry(event.checksum.clone()).or_default().push(event);
    }
    let mut histories: Vec<MsbHistory> = grouped
        .into_iter()
        .filter_map(|(checksum, events)| reconcile(&checksum, events))
        .collect();
    histories.sort_by(|a, b| {
        a.last_activity()
            .cmp(&b.last_activity())
            .then_with(|| a.checksum.cmp(&b.checksum))
    });
    histories
}

/// Whether a new event was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Appended,

    /// A Fetch for an MSB that already had history. Nothing was written.
    DuplicateFetch,
}

/// Records events and answers history queries over an [`EventLog`].
#[derive(Debug)]
pub struct HistoryStore<L> {
    log: L,
}

impl<L: EventLog> HistoryStore<L> {
    pub fn new(log: L) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Appends an event. A Fetch is written only if it is the first event
    /// for its checksum and project.
    pub fn record(&self, event: &ObservationEvent) -> Result<Recorded> {
        let policy = if event.status.is_placeholder() {
            AppendPolicy::IfFirstForMsb
        } else {
            AppendPolicy::Always
        };
        if self.log.append(event, policy)? {
            debug!(
                project = %event.project_id,
                checksum = %event.checksum,
                status = %event.status,
                "event recorded"
            );
            Ok(Recorded::Appended)
        } else {
            Ok(Recorded::DuplicateFetch)
        }
    }

    /// The visible history of one MSB.
    pub fn history(&self, checksum: &Checksum) -> Result<MsbHistory> {
        let events = self.log.for_checksum(checksum)?;
        reconcile(checksum, events).ok_or_else(|| HistoryError::UnknownMsb(checksum.clone()))
    }

    /// Histories of every MSB in a project, optionally limited to events in `window`.
    pub fn project_history(
        &self,
        project: &str,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<MsbHistory>> {
        Ok(reconcile_all(self.log.for_project(project, window)?))
    }

    /// Histories of MSBs observed within `window`, showing only events in it.
    pub fn observed_between(&self, window: &TimeWindow) -> Result<Vec<MsbHistory>> {
        let mut histories = reconcile_all(self.log.between(window)?);
        histories.retain(|h| h.times_observed() > 0);
        Ok(histories)
    }

    /// The newest event for `checksum` that carries MSB metadata.
    pub fn latest_metadata(&self, checksum: &Checksum) -> Result<Option<ObservationEvent>> {
        let events = self.log.for_checksum(checksum)?;
        Ok(events.into_iter().rev().find(ObservationEvent::has_metadata))
    }
}
