//! Observation events: rows of the append-only done log.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::msb::{Checksum, MsbSummary};

/// What happened to an MSB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventStatus {
    /// The MSB was handed to an observer. A placeholder that guarantees
    /// the done log knows the MSB's metadata before anything else happens.
    Fetch,

    /// One repeat was observed.
    Done,

    /// A free-text remark.
    Comment,

    /// Withdrawn from scheduling.
    AllDone,

    /// A previous observation was reversed.
    Undone,

    /// Observation started but did not complete.
    Aborted,

    /// Data was taken but judged unusable.
    Rejected,

    /// Observation stopped part way, to be resumed later.
    Suspended,
}

impl EventStatus {
    pub const ALL: [Self; 8] = [
        Self::Fetch,
        Self::Done,
        Self::Comment,
        Self::AllDone,
        Self::Undone,
        Self::Aborted,
        Self::Rejected,
        Self::Suspended,
    ];

    /// Whether this status is only a guarantee-of-existence placeholder.
    pub fn is_placeholder(self) -> bool {
        matches!(self, Self::Fetch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Done => "done",
            Self::Comment => "comment",
            Self::AllDone => "allDone",
            Self::Undone => "undone",
            Self::Aborted => "aborted",
            Self::Rejected => "rejected",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown event status: {s}"))
    }
}

/// One immutable row of the done log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationEvent {
    pub checksum: Checksum,
    pub project_id: String,
    pub timestamp: Timestamp,
    pub status: EventStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Who caused the event. Passed through as given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveband: Option<String>,
}

impl ObservationEvent {
    /// An event with no metadata attached.
    pub fn new(
        checksum: Checksum,
        project_id: impl Into<String>,
        status: EventStatus,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            checksum,
            project_id: project_id.into(),
            timestamp,
            status,
            comment: None,
            author: None,
            title: None,
            target: None,
            instrument: None,
            waveband: None,
        }
    }

    /// An event carrying the MSB's summary metadata.
    pub fn for_msb(summary: &MsbSummary, status: EventStatus, timestamp: Timestamp) -> Self {
        Self::new(
            summary.checksum.clone(),
            summary.project_id.clone(),
            status,
            timestamp,
        )
        .with_metadata_from(summary)
    }

    pub fn with_metadata_from(mut self, summary: &MsbSummary) -> Self {
        self.title = Some(summary.title.clone());
        self.target = summary.target.as_ref().map(|t| t.name.clone());
        self.instrument = summary.instrument_label();
        self.waveband = summary.waveband_label();
        self
    }

    /// Copies title/target/instrument/waveband from an earlier event.
    pub fn with_metadata_of(mut self, other: &Self) -> Self {
        self.title.clone_from(&other.title);
        self.target.clone_from(&other.target);
        self.instrument.clone_from(&other.instrument);
        self.waveband.clone_from(&other.waveband);
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    /// Whether any of the summary metadata fields are populated.
    pub fn has_metadata(&self) -> bool {
        self.title.is_some()
            || self.target.is_some()
            || self.instrument.is_some()
            || self.waveband.is_some()
    }
}
