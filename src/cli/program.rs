//! Program subcommands: store, show, list.

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Subcommand;
use jiff::Timestamp;

use msbdb::program::ProgramDocument;

use super::{Db, format::format_msb};

#[derive(Debug, Subcommand)]
pub enum ProgramCommand {
    /// Store a program from a JSON document, replacing any earlier version.
    Store {
        /// Path to the program document.
        file: PathBuf,

        /// Timestamp of the version this edit started from.
        #[arg(long)]
        expected: Option<Timestamp>,

        /// Overwrite even if the stored version is newer.
        #[arg(long)]
        force: bool,
    },

    /// Show every MSB in a program with its state.
    Show {
        /// Project identifier, e.g. `M01BU01`.
        project: String,

        /// Print the stored program document as JSON instead.
        #[arg(long)]
        json: bool,
    },

    /// List stored projects.
    List,
}

pub(super) fn run(db: &Db, command: ProgramCommand) -> Result<(), String> {
    match command {
        ProgramCommand::Store {
            file,
            expected,
            force,
        } => cmd_store(db, &file, expected, force),
        ProgramCommand::Show { project, json } => cmd_show(db, &project, json),
        ProgramCommand::List => cmd_list(db),
    }
}

fn cmd_store(
    db: &Db,
    file: &Path,
    expected: Option<Timestamp>,
    force: bool,
) -> Result<(), String> {
    let contents = fs::read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let doc: ProgramDocument = serde_json::from_str(&contents)
        .map_err(|e| format!("invalid program document {}: {e}", file.display()))?;

    let receipt = db
        .store_program(&doc, expected, force)
        .map_err(|e| format!("failed to store program: {e}"))?;

    println!(
        "Stored {} at {} ({} MSBs, {} active)",
        receipt.project_id, receipt.timestamp, receipt.msbs, receipt.active
    );
    for (checksum, count) in &receipt.duplicates {
        println!("  warning: {count} MSBs share checksum {checksum}");
    }
    Ok(())
}

fn cmd_show(db: &Db, project: &str, json: bool) -> Result<(), String> {
    if json {
        let stored = db
            .load_program(project)
            .map_err(|e| format!("failed to load program: {e}"))?;
        let rendered = serde_json::to_string_pretty(&stored.tree.to_document())
            .map_err(|e| format!("failed to render program: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }

    let summary = db
        .summary(project)
        .map_err(|e| format!("failed to load program: {e}"))?;

    match &summary.title {
        Some(title) => println!("{}: {title}", summary.project_id),
        None => println!("{}", summary.project_id),
    }
    println!("  stored {}", summary.timestamp);
    println!("  {} of {} MSBs active", summary.active, summary.msbs.len());
    println!();
    for msb in &summary.msbs {
        println!("{}", format_msb(msb));
    }
    Ok(())
}

fn cmd_list(db: &Db) -> Result<(), String> {
    let projects = db
        .projects()
        .map_err(|e| format!("failed to list programs: {e}"))?;

    if projects.is_empty() {
        println!("No programs stored.");
        return Ok(());
    }
    for project in &projects {
        println!("{project}");
    }
    Ok(())
}
