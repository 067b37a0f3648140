//! CLI interface for msbdb.
//!
//! A thin operator front-end over the library: arguments in, text out.
//! Commands split into groups:
//!
//! - `msbdb program store|show|list`: science program submission and inspection.
//! - `msbdb query`: which MSBs can be observed under given conditions.
//! - `msbdb fetch|done|remove|undo|suspend|reject|abort|comment`: MSB events.
//! - `msbdb history|observed`: the done log.
//!
//! Elevation is not computed here, so queries never filter on it.

mod format;
mod history;
mod msb;
mod program;
mod query;

use clap::{Parser, Subcommand};

use msbdb::{
    config::Config,
    db::{Annotation, MsbDb},
    identity::resolve_identity,
    storage::Storage,
};

use history::HistoryArgs;
use msb::{MsbArgs, SuspendArgs};
use program::ProgramCommand;
use query::QueryArgs;

type Db = MsbDb<Storage, Storage>;

/// msbdb: MSB lifecycle, scheduling queries, and observation history.
#[derive(Debug, Parser)]
#[command(name = "msbdb", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Identity recorded as the author of events.
    /// Falls back to `MSBDB_IDENTITY`, then `identity` in the config.
    #[arg(long = "as", global = true)]
    identity: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Workflow: an observing night
  1. msbdb program store m01bu01.json
  2. msbdb query --tau 0.08 --instrument SCUBA-2 --max 5
  3. msbdb fetch M01BU01 3f2a...
  4. msbdb done M01BU01 3f2a... --comment 'clear, stable'
  5. msbdb observed --since 2026-10-19T06:00:00Z

Resubmitting a program needs the timestamp it was loaded at:
  msbdb program show M01BU01            → prints the stored timestamp
  msbdb program store m01bu01.json --expected 2026-10-19T05:12:44.123Z";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store, show, and list science programs.
    Program {
        #[command(subcommand)]
        command: ProgramCommand,
    },

    /// Find MSBs that can be observed under the given conditions.
    Query(QueryArgs),

    /// Hand out an MSB for observation. Logs a fetch placeholder.
    Fetch(MsbArgs),

    /// Record one completed observation of an MSB.
    Done(MsbArgs),

    /// Withdraw an MSB from scheduling without observing it.
    Remove(MsbArgs),

    /// Reverse one observation of an MSB.
    Undo(MsbArgs),

    /// Record that an observation stopped part way.
    Suspend(SuspendArgs),

    /// Record that an MSB was rejected. No change to the program.
    Reject(MsbArgs),

    /// Record that an observation was aborted. No change to the program.
    Abort(MsbArgs),

    /// Attach a comment to an MSB's history.
    Comment(MsbArgs),

    /// Show the history of one MSB or of a whole project.
    History(HistoryArgs),

    /// Show MSBs observed within a time range.
    Observed {
        /// Start of the range (inclusive), e.g. `2026-10-19T06:00:00Z`.
        #[arg(long)]
        since: jiff::Timestamp,

        /// End of the range (exclusive). Defaults to now.
        #[arg(long)]
        until: Option<jiff::Timestamp>,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, db: &Db) -> Result<(), String> {
    let cli = Cli::parse();
    let author = resolve_identity(cli.identity.as_deref(), config);

    match cli.command {
        Command::Program { command } => program::run(db, command),
        Command::Query(args) => query::cmd_query(db, &args),
        Command::Fetch(args) => msb::cmd_fetch(db, &args),
        Command::Done(args) => msb::cmd_done(db, &args, annotation(author, &args)),
        Command::Remove(args) => msb::cmd_remove(db, &args, annotation(author, &args)),
        Command::Undo(args) => msb::cmd_undo(db, &args, annotation(author, &args)),
        Command::Suspend(args) => {
            let note = annotation(author, &args.msb);
            msb::cmd_suspend(db, &args, note)
        }
        Command::Reject(args) => msb::cmd_reject(db, &args, annotation(author, &args)),
        Command::Abort(args) => msb::cmd_abort(db, &args, annotation(author, &args)),
        Command::Comment(args) => {
            if args.comment.is_none() {
                return Err("comment requires --comment <text>".to_string());
            }
            msb::cmd_comment(db, &args, annotation(author, &args))
        }
        Command::History(args) => history::cmd_history(db, &args),
        Command::Observed { since, until } => history::cmd_observed(db, since, until),
    }
}

fn annotation(author: Option<String>, args: &MsbArgs) -> Annotation {
    Annotation {
        author,
        comment: args.comment.clone(),
    }
}
