//! MSB identity, repeat counts, and flattened summaries.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{component::Target, range::Range};

/// Content identity of an MSB: 128 bits rendered as lowercase hex.
///
/// Stable across resubmission of the same scientific content, so it is the
/// key that ties observation history to MSBs across program versions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Checksum {
    fn from(s: &str) -> Self {
        Self(s.to_ascii_lowercase())
    }
}

impl From<String> for Checksum {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How many more times an MSB should be observed.
///
/// `Removed` marks an MSB withdrawn from scheduling without being observed,
/// either administratively or because its Or-folder ran out of picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Remaining {
    Count(u32),
    Removed,
}

impl Default for Remaining {
    fn default() -> Self {
        Self::Count(1)
    }
}

impl Remaining {
    pub fn state(self) -> MsbState {
        match self {
            Self::Count(0) => MsbState::Exhausted,
            Self::Count(_) => MsbState::Eligible,
            Self::Removed => MsbState::Removed,
        }
    }

    /// The count, or `None` when removed.
    pub fn count(self) -> Option<u32> {
        match self {
            Self::Count(n) => Some(n),
            Self::Removed => None,
        }
    }

    /// One fewer observation required. Floors at zero; `Removed` stays removed.
    pub fn decremented(self) -> Self {
        match self {
            Self::Count(n) => Self::Count(n.saturating_sub(1)),
            Self::Removed => Self::Removed,
        }
    }

    /// One more observation required. A removed MSB comes back with a count of one.
    pub fn incremented(self) -> Self {
        match self {
            Self::Count(n) => Self::Count(n.saturating_add(1)),
            Self::Removed => Self::Count(1),
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Removed => f.write_str("removed"),
        }
    }
}

/// Scheduling state derived from [`Remaining`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MsbState {
    /// Still needs observing.
    Eligible,

    /// Observed as many times as requested.
    Exhausted,

    /// Withdrawn without being observed to completion.
    Removed,
}

impl fmt::Display for MsbState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eligible => "eligible",
            Self::Exhausted => "exhausted",
            Self::Removed => "removed",
        })
    }
}

/// A flat view of one MSB with its references resolved.
///
/// This is what queries match against and what fetch hands to an observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsbSummary {
    pub project_id: String,
    pub checksum: Checksum,
    pub title: String,
    pub priority: i32,
    pub remaining: Remaining,
    pub suspended: Option<String>,
    pub target: Option<Target>,
    pub instruments: Vec<String>,
    pub wavebands: Vec<String>,
    pub duration_secs: f64,
    pub tau: Range,
    pub seeing: Range,
    pub cloud: Range,
    pub elevation: Range,
    pub earliest: Option<Timestamp>,
    pub latest: Option<Timestamp>,
}

impl MsbSummary {
    pub fn state(&self) -> MsbState {
        self.remaining.state()
    }

    /// All instruments joined with `/`, as shown in listings and history rows.
    pub fn instrument_label(&self) -> Option<String> {
        (!self.instruments.is_empty()).then(|| self.instruments.join("/"))
    }

    pub fn waveband_label(&self) -> Option<String> {
        (!self.wavebands.is_empty()).then(|| self.wavebands.join("/"))
    }
}
