//! MSB event subcommands.
//!
//! Each records one event against an MSB. Done, remove, undo and suspend
//! also change the stored program; the rest only log.

use clap::Args;

use msbdb::{
    db::{Annotation, Receipt},
    history::Recorded,
    model::Checksum,
};

use super::{Db, format::format_msb};

#[derive(Debug, Args)]
pub struct MsbArgs {
    /// Project identifier.
    pub project: String,

    /// MSB checksum, as printed by `query` or `program show`.
    pub checksum: String,

    /// Comment recorded with the event.
    #[arg(long, short)]
    pub comment: Option<String>,
}

impl MsbArgs {
    fn checksum(&self) -> Checksum {
        Checksum::from(self.checksum.as_str())
    }
}

#[derive(Debug, Args)]
pub struct SuspendArgs {
    #[command(flatten)]
    pub msb: MsbArgs,

    /// Where the observation stopped, e.g. an observation label.
    #[arg(long)]
    pub label: String,
}

pub(super) fn cmd_fetch(db: &Db, args: &MsbArgs) -> Result<(), String> {
    let (summary, recorded) = db
        .fetch_msb(&args.project, &args.checksum())
        .map_err(|e| format!("failed to fetch MSB: {e}"))?;

    println!("{}", format_msb(&summary));
    if recorded == Recorded::DuplicateFetch {
        println!("  (already fetched before)");
    }
    Ok(())
}

pub(super) fn cmd_done(db: &Db, args: &MsbArgs, note: Annotation) -> Result<(), String> {
    let receipt = db
        .done(&args.project, &args.checksum(), &note)
        .map_err(|e| format!("failed to mark MSB done: {e}"))?;
    report("Marked done", &receipt);
    Ok(())
}

pub(super) fn cmd_remove(db: &Db, args: &MsbArgs, note: Annotation) -> Result<(), String> {
    let receipt = db
        .remove(&args.project, &args.checksum(), &note)
        .map_err(|e| format!("failed to remove MSB: {e}"))?;
    report("Removed", &receipt);
    Ok(())
}

pub(super) fn cmd_undo(db: &Db, args: &MsbArgs, note: Annotation) -> Result<(), String> {
    let receipt = db
        .undo(&args.project, &args.checksum(), &note)
        .map_err(|e| format!("failed to undo MSB: {e}"))?;
    report("Undone", &receipt);
    Ok(())
}

pub(super) fn cmd_suspend(db: &Db, args: &SuspendArgs, note: Annotation) -> Result<(), String> {
    let receipt = db
        .suspend(&args.msb.project, &args.msb.checksum(), &args.label, &note)
        .map_err(|e| format!("failed to suspend MSB: {e}"))?;
    report(&format!("Suspended at {}", args.label), &receipt);
    Ok(())
}

pub(super) fn cmd_reject(db: &Db, args: &MsbArgs, note: Annotation) -> Result<(), String> {
    let receipt = db
        .reject(&args.project, &args.checksum(), &note)
        .map_err(|e| format!("failed to record rejection: {e}"))?;
    report("Rejected", &receipt);
    Ok(())
}

pub(super) fn cmd_abort(db: &Db, args: &MsbArgs, note: Annotation) -> Result<(), String> {
    let receipt = db
        .abort(&args.project, &args.checksum(), &note)
        .map_err(|e| format!("failed to record abort: {e}"))?;
    report("Aborted", &receipt);
    Ok(())
}

pub(super) fn cmd_comment(db: &Db, args: &MsbArgs, note: Annotation) -> Result<(), String> {
    let receipt = db
        .comment(&args.project, &args.checksum(), &note)
        .map_err(|e| format!("failed to record comment: {e}"))?;
    report("Commented on", &receipt);
    Ok(())
}

fn report(action: &str, receipt: &Receipt) {
    let event = &receipt.event;
    println!("{action} {} ({})", event.checksum, event.project_id);
    if receipt.msb_missing() {
        println!("  note: MSB not in the stored program; event logged only");
    }
}
