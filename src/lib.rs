//! msbdb: Minimum Schedulable Block database.
//!
//! Science programs are stored as trees of folders, MSBs and observation
//! components. Observers query for MSBs that fit the current conditions,
//! then record what happened: done, removed, undone, suspended, rejected,
//! aborted, or commented on. Each event updates the program where needed
//! and lands in an append-only log that the history views read.
//!
//! [`db::MsbDb`] is the entry point; it composes a [`storage::ProgramStore`]
//! and a [`storage::EventLog`].

pub mod checksum;
pub mod config;
pub mod db;
pub mod history;
pub mod identity;
pub mod lifecycle;
pub mod model;
pub mod program;
pub mod query;
pub mod storage;

pub use db::{Error, MsbDb};
pub use query::Query;
