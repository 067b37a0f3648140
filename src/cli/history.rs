use clap::Args;
use jiff::Timestamp;

use msbdb::model::{Checksum, TimeWindow};

use super::{Db, format::format_history};

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// MSB checksum. Omit when using `--project`.
    #[arg(required_unless_present = "project", conflicts_with = "project")]
    checksum: Option<String>,

    /// Show every MSB with history in this project.
    #[arg(long)]
    project: Option<String>,

    /// With `--project`, only events at or after this time.
    #[arg(long, requires = "project")]
    since: Option<Timestamp>,

    /// With `--project`, only events before this time. Defaults to now.
    #[arg(long, requires = "since")]
    until: Option<Timestamp>,
}

pub(super) fn cmd_history(db: &Db, args: &HistoryArgs) -> Result<(), String> {
    if let Some(project) = &args.project {
        let window = args.since.map(|since| window(since, args.until));
        let histories = db
            .project_history(project, window.as_ref())
            .map_err(|e| format!("failed to read history: {e}"))?;
        if histories.is_empty() {
            println!("No history for {project}.");
        }
        for history in &histories {
            println!("{}", format_history(history));
        }
        return Ok(());
    }

    let checksum = args
        .checksum
        .as_deref()
        .ok_or("history needs a checksum or --project")?;
    let history = db
        .history(&Checksum::from(checksum))
        .map_err(|e| format!("failed to read history: {e}"))?;
    println!("{}", format_history(&history));
    Ok(())
}

pub(super) fn cmd_observed(
    db: &Db,
    since: Timestamp,
    until: Option<Timestamp>,
) -> Result<(), String> {
    let histories = db
        .observed_between(&window(since, until))
        .map_err(|e| format!("failed to read history: {e}"))?;

    if histories.is_empty() {
        println!("Nothing observed.");
    }
    for history in &histories {
        println!("{}", format_history(history));
    }
    Ok(())
}

fn window(since: Timestamp, until: Option<Timestamp>) -> TimeWindow {
    TimeWindow::new(since, until.unwrap_or_else(Timestamp::now))
}
