use clap::Args;

use msbdb::query::{NoEphemeris, Query};

use super::{Db, format::format_candidate};

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Current sky opacity (225 GHz tau).
    #[arg(long)]
    tau: Option<f64>,

    /// Current seeing, in arcseconds.
    #[arg(long)]
    seeing: Option<f64>,

    /// Current cloud cover, in percent.
    #[arg(long)]
    cloud: Option<f64>,

    /// Available instrument. Repeat for several; omit to allow any.
    #[arg(long = "instrument")]
    instruments: Vec<String>,

    /// Restrict to a project. Repeat for several.
    #[arg(long = "project")]
    projects: Vec<String>,

    /// Maximum results. 0 uses the configured default; negative is unlimited.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    max: i64,
}

impl QueryArgs {
    fn to_query(&self) -> Query {
        let mut query = Query::new().with_max_results(self.max);
        if let Some(tau) = self.tau {
            query = query.at_tau(tau);
        }
        if let Some(seeing) = self.seeing {
            query = query.at_seeing(seeing);
        }
        if let Some(cloud) = self.cloud {
            query = query.at_cloud(cloud);
        }
        for instrument in &self.instruments {
            query = query.with_instrument(instrument);
        }
        for project in &self.projects {
            query = query.with_project(project);
        }
        query
    }
}

pub(super) fn cmd_query(db: &Db, args: &QueryArgs) -> Result<(), String> {
    let candidates = db
        .query(&args.to_query(), &NoEphemeris)
        .map_err(|e| format!("query failed: {e}"))?;

    if candidates.is_empty() {
        println!("No observable MSBs.");
        return Ok(());
    }
    for candidate in &candidates {
        println!("{}", format_candidate(candidate));
    }
    Ok(())
}
