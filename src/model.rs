//! Core data model for msbdb.
//!
//! These types describe what the scheduler reasons about:
//! MSB identity and repeat counts, the components that make up an
//! observation, and the events recorded when MSBs are fetched or observed.

mod component;
mod event;
mod msb;
mod range;

pub use component::{
    Component, Coordinates, Instrument, ObservationSetup, SchedConstraints, SiteQuality, Target,
};
pub use event::{EventStatus, ObservationEvent};
pub use msb::{Checksum, MsbState, MsbSummary, Remaining};
pub use range::{Range, TimeWindow};
