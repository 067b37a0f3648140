//! Output formatting for CLI display.

use msbdb::{
    history::MsbHistory,
    model::{MsbSummary, ObservationEvent, Range},
    query::Candidate,
};

/// One line per MSB: checksum, state, priority, title, instruments.
pub(super) fn format_msb(msb: &MsbSummary) -> String {
    let instruments = msb.instrument_label().unwrap_or_else(|| "-".to_string());
    let target = msb.target.as_ref().map_or("-", |t| t.name.as_str());
    let suspended = msb
        .suspended
        .as_ref()
        .map(|label| format!("  (suspended at {label})"))
        .unwrap_or_default();
    format!(
        "{}  [{:<9}] p{:<3} {:<24} {:<16} {}{suspended}",
        msb.checksum,
        format!("{} {}", msb.state(), msb.remaining),
        msb.priority,
        msb.title,
        target,
        instruments,
    )
}

pub(super) fn format_range(range: &Range) -> String {
    match (range.min, range.max) {
        (None, None) => "any".to_string(),
        (Some(lo), None) => format!(">= {lo}"),
        (None, Some(hi)) => format!("<= {hi}"),
        (Some(lo), Some(hi)) if lo == hi => format!("{lo}"),
        (Some(lo), Some(hi)) => format!("{lo}..{hi}"),
    }
}

pub(super) fn format_candidate(candidate: &Candidate) -> String {
    let explain = &candidate.explain;
    let elevation = explain
        .elevation
        .as_ref()
        .map_or_else(|| "unknown".to_string(), format_range);
    format!(
        "{}  {}\n    tau {}  seeing {}  cloud {}  elevation {}",
        candidate.msb.project_id,
        format_msb(&candidate.msb),
        format_range(&explain.tau),
        format_range(&explain.seeing),
        format_range(&explain.cloud),
        elevation,
    )
}

pub(super) fn format_event(event: &ObservationEvent) -> String {
    let mut line = format!("  {}  {:<9}", event.timestamp, event.status);
    if let Some(author) = &event.author {
        line.push_str(&format!("  by {author}"));
    }
    if let Some(comment) = &event.comment {
        line.push_str(&format!("  {comment}"));
    }
    line
}

pub(super) fn format_history(history: &MsbHistory) -> String {
    let describe = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let mut out = format!(
        "{}  {}  {}\n  target {}  instrument {}  waveband {}  observed {}",
        history.checksum,
        history.project_id,
        describe(&history.title),
        describe(&history.target),
        describe(&history.instrument),
        describe(&history.waveband),
        history.times_observed(),
    );
    for event in &history.events {
        out.push('\n');
        out.push_str(&format_event(event));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_read_naturally() {
        assert_eq!(format_range(&Range::UNBOUNDED), "any");
        assert_eq!(format_range(&Range::at_most(0.12)), "<= 0.12");
        assert_eq!(format_range(&Range::at_least(30.0)), ">= 30");
        assert_eq!(format_range(&Range::exactly(0.08)), "0.08");
        assert_eq!(format_range(&Range::new(0.2, 0.4)), "0.2..0.4");
    }
}
