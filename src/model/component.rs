//! Components: the scientific content of an MSB.
//!
//! Only components contribute to an MSB's checksum. Everything on the
//! enclosing MSB itself (title, priority, repeat count) is bookkeeping.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::range::Range;

/// A single piece of observation setup.
///
/// Serialization order of fields is the canonical order used for hashing,
/// so fields must not be reordered once programs are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Component {
    /// Where the telescope points.
    Target(Target),

    /// Which instrument takes the data.
    Instrument(Instrument),

    /// Acceptable weather: opacity, seeing, cloud cover.
    SiteQuality(SiteQuality),

    /// Scheduling constraints: elevation and date limits.
    SchedConstraints(SchedConstraints),

    /// An observation with its iterator sequence.
    Observation(ObservationSetup),
}

impl Component {
    /// Short name of the component type, used in logs and listings.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Target(_) => "target",
            Self::Instrument(_) => "instrument",
            Self::SiteQuality(_) => "siteQuality",
            Self::SchedConstraints(_) => "schedConstraints",
            Self::Observation(_) => "observation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    pub coordinates: Coordinates,
}

/// How a target's position is specified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "system", rename_all = "camelCase")]
pub enum Coordinates {
    /// Fixed J2000 position, in degrees.
    Equatorial { ra_deg: f64, dec_deg: f64 },

    /// A solar-system body whose position comes from an ephemeris.
    Planet { body: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub name: String,

    /// Observing band, e.g. `"850um"` or `"345.796GHz"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveband: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteQuality {
    #[serde(default)]
    pub tau: Range,

    /// Seeing, in arcseconds.
    #[serde(default)]
    pub seeing: Range,

    /// Cloud cover, in percent.
    #[serde(default)]
    pub cloud: Range,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedConstraints {
    /// Allowed elevation, in degrees.
    #[serde(default)]
    pub elevation: Range,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationSetup {
    pub title: String,

    /// Estimated on-sky time, in seconds.
    pub duration_secs: f64,

    /// Iterator steps in execution order (e.g. `"offset 0,0"`, `"raster 3x3"`).
    #[serde(default)]
    pub iterators: Vec<String>,
}
