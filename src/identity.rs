//! Author resolution for recorded events.
//!
//! Events carry the identity of whoever recorded them. It is resolved
//! through a chain:
//!
//! 1. `--as <identity>`: explicit per-command override
//! 2. `MSBDB_IDENTITY` env var: process/session level
//! 3. `identity` in `~/.msbdb/config.toml`: global default
//!
//! The result is passed through unchanged; an unresolved identity simply
//! leaves the event's author empty.

use std::env;

use crate::config::Config;

/// Environment variable consulted after `--as`.
pub const IDENTITY_VAR: &str = "MSBDB_IDENTITY";

/// Resolve the acting identity from the tiered resolution chain.
pub fn resolve_identity(explicit: Option<&str>, config: &Config) -> Option<String> {
    resolve_from(explicit, env::var(IDENTITY_VAR).ok(), config)
}

fn resolve_from(explicit: Option<&str>, from_env: Option<String>, config: &Config) -> Option<String> {
    let non_empty = |s: &String| !s.trim().is_empty();

    // 1. Explicit --as flag.
    if let Some(id) = explicit.map(str::to_string).filter(non_empty) {
        return Some(id);
    }

    // 2. MSBDB_IDENTITY environment variable.
    if let Some(id) = from_env.filter(non_empty) {
        return Some(id);
    }

    // 3. ~/.msbdb/config.toml.
    config.identity.clone().filter(non_empty)
}
