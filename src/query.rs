//! Scheduling queries: which MSBs can be observed under given conditions.
//!
//! A [`Query`] is a conjunction of constraints. An MSB matches when it is
//! eligible, its site-quality ranges overlap the query's operating ranges,
//! every instrument it uses is allowed, its project is allowed, its date
//! constraints touch the query window, and (when an [`ElevationSource`]
//! knows its target) the target's elevation range overlaps both the MSB's
//! own limits and the query's.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    model::{MsbState, MsbSummary, Range, Target, TimeWindow},
    program::ProgramTree,
};

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),
}

pub type Result<T> = core::result::Result<T, QueryError>;

/// Supplies target elevations for a query.
///
/// Implemented by the coordinate/ephemeris service; queries never compute
/// positions themselves.
pub trait ElevationSource {
    /// Elevation range in degrees reached by `target` during `window`, or
    /// `None` when the source cannot say.
    fn elevation(&self, target: &Target, window: Option<&TimeWindow>) -> Option<Range>;
}

/// An elevation source that never has data, so no elevation filtering applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEphemeris;

impl ElevationSource for NoEphemeris {
    fn elevation(&self, _target: &Target, _window: Option<&TimeWindow>) -> Option<Range> {
        None
    }
}

impl<F> ElevationSource for F
where
    F: Fn(&Target, Option<&TimeWindow>) -> Option<Range>,
{
    fn elevation(&self, target: &Target, window: Option<&TimeWindow>) -> Option<Range> {
        self(target, window)
    }
}

/// Constraints for a scheduling query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default)]
    pub tau: Range,

    #[serde(default)]
    pub seeing: Range,

    #[serde(default)]
    pub cloud: Range,

    /// Acceptable target elevation, in degrees.
    #[serde(default)]
    pub elevation: Range,

    /// Instruments available. Empty allows any.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub instruments: BTreeSet<String>,

    /// Projects to search. Empty searches all.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub projects: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,

    /// Negative for no limit, zero for the configured default, positive
    /// for an exact cap.
    #[serde(default)]
    pub max_results: i64,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tau(mut self, range: Range) -> Self {
        self.tau = range;
        self
    }

    /// Current opacity: matches MSBs whose tau range contains `value`.
    pub fn at_tau(self, value: f64) -> Self {
        self.with_tau(Range::exactly(value))
    }

    pub fn with_seeing(mut self, range: Range) -> Self {
        self.seeing = range;
        self
    }

    pub fn at_seeing(self, value: f64) -> Self {
        self.with_seeing(Range::exactly(value))
    }

    pub fn with_cloud(mut self, range: Range) -> Self {
        self.cloud = range;
        self
    }

    pub fn at_cloud(self, value: f64) -> Self {
        self.with_cloud(Range::exactly(value))
    }

    pub fn with_elevation(mut self, range: Range) -> Self {
        self.elevation = range;
        self
    }

    pub fn with_instrument(mut self, name: impl Into<String>) -> Self {
        self.instruments.insert(name.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.projects.insert(project.into());
        self
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_max_results(mut self, max: i64) -> Self {
        self.max_results = max;
        self
    }

    /// Rejects constraints that cannot describe any conditions.
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("tau", &self.tau),
            ("seeing", &self.seeing),
            ("cloud", &self.cloud),
            ("elevation", &self.elevation),
        ] {
            if !range.is_valid() {
                return Err(QueryError::InvalidConstraint(format!(
                    "{name} range {range:?} is not an ordered pair of finite numbers"
                )));
            }
        }
        if let Some(window) = &self.window
            && !window.is_valid()
        {
            return Err(QueryError::InvalidConstraint(format!(
                "time window ends ({}) before it starts ({})",
                window.end, window.start
            )));
        }
        if self.instruments.iter().any(|i| i.trim().is_empty()) {
            return Err(QueryError::InvalidConstraint(
                "instrument names must not be empty".to_string(),
            ));
        }
        if self.projects.iter().any(|p| p.trim().is_empty()) {
            return Err(QueryError::InvalidConstraint(
                "project ids must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The number of results to keep, or `None` for all of them.
    pub fn cap(&self, default_cap: usize) -> Option<usize> {
        match self.max_results {
            n if n < 0 => None,
            0 => Some(default_cap),
            n => Some(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }

    fn allows_project(&self, project: &str) -> bool {
        self.projects.is_empty() || self.projects.contains(project)
    }

    fn allows_instruments(&self, used: &[String]) -> bool {
        self.instruments.is_empty()
            || used.iter().all(|name| {
                self.instruments
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(name))
            })
    }
}

/// Why a candidate matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explain {
    /// Overlap of the MSB's and the query's tau ranges.
    pub tau: Range,
    pub seeing: Range,
    pub cloud: Range,

    /// Elevation range used, clipped to the MSB's limits. `None` when no
    /// elevation was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<Range>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,
}

/// An MSB that satisfies a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub msb: MsbSummary,
    pub explain: Explain,
}

/// Finds the MSBs in `tree` that match `query`.
pub fn find(
    tree: &ProgramTree,
    query: &Query,
    elevation: &dyn ElevationSource,
    default_cap: usize,
) -> Result<Vec<Candidate>> {
    find_all([tree], query, elevation, default_cap)
}

/// Finds matching MSBs across several programs.
///
/// Results are ordered by priority, then checksum, then project, and only
/// then truncated, so the same inputs always give the same list.
pub fn find_all<'a>(
    trees: impl IntoIterator<Item = &'a ProgramTree>,
    query: &Query,
    elevation: &dyn ElevationSource,
    default_cap: usize,
) -> Result<Vec<Candidate>> {
    query.validate()?;

    let mut candidates = Vec::new();
    let mut searched = 0usize;
    for tree in trees {
        if !query.allows_project(tree.project_id()) {
            continue;
        }
        for msb in tree.msbs() {
            if tree.msb(msb).is_none_or(|m| m.state() != MsbState::Eligible) {
                continue;
            }
            searched += 1;
            let summary = match tree.summary(msb) {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(project = tree.project_id(), node = %msb, error = %e, "skipping MSB in query");
                    continue;
                }
            };
            if let Some(explain) = matches(&summary, query, elevation) {
                candidates.push(Candidate {
                    msb: summary,
                    explain,
                });
            }
        }
    }

    candidates.sort_by(|a, b| {
        a.msb
            .priority
            .cmp(&b.msb.priority)
            .then_with(|| a.msb.checksum.cmp(&b.msb.checksum))
            .then_with(|| a.msb.project_id.cmp(&b.msb.project_id))
    });
    let matched = candidates.len();
    if let Some(cap) = query.cap(default_cap) {
        candidates.truncate(cap);
    }
    debug!(searched, matched, returned = candidates.len(), "query complete");
    Ok(candidates)
}

/// Checks one MSB against every constraint.
fn matches(
    msb: &MsbSummary,
    query: &Query,
    source: &dyn ElevationSource,
) -> Option<Explain> {
    let tau = msb.tau.intersection(&query.tau)?;
    let seeing = msb.seeing.intersection(&query.seeing)?;
    let cloud = msb.cloud.intersection(&query.cloud)?;

    if !query.allows_instruments(&msb.instruments) {
        return None;
    }
    if let Some(window) = &query.window
        && !window.overlaps_bounds(msb.earliest, msb.latest)
    {
        return None;
    }

    let reached = msb
        .target
        .as_ref()
        .and_then(|t| source.elevation(t, query.window.as_ref()));
    let elevation = match reached {
        Some(range) => Some(
            range
                .intersection(&msb.elevation)?
                .intersection(&query.elevation)?,
        ),
        None => None,
    };

    Some(Explain {
        tau,
        seeing,
        cloud,
        elevation,
        window: query.window,
    })
}
