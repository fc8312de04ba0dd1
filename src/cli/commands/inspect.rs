//! `neo inspect` command - look up a single NEO

use clap::ArgGroup;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::{self, Write};

use crate::cli::commands::utils::{plural, Context};
use crate::cli::output::{write_approaches, write_neos};
use crate::cli::OutputFormat;
use crate::core::database::NeoDatabase;
use crate::core::model::{Approach, ApproachRecord, NearEarthObject, NeoRecord};

#[derive(clap::Args, Debug, Clone)]
#[command(group(ArgGroup::new("target").required(true).args(["pdes", "name"])))]
pub struct InspectArgs {
    /// Primary designation of the NEO (e.g. 433)
    #[arg(long, short = 'p')]
    pub pdes: Option<String>,

    /// IAU name of the NEO (e.g. Halley), case-insensitive
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Also list every known close approach of the NEO
    #[arg(long, short = 'a')]
    pub approaches: bool,
}

#[derive(Serialize)]
struct InspectJson {
    #[serde(flatten)]
    neo: NeoRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    approaches: Option<Vec<ApproachRecord>>,
}

/// Find the object named by `args`, preferring the designation
pub fn find<'a>(db: &'a NeoDatabase, args: &InspectArgs) -> Option<&'a NearEarthObject> {
    match (&args.pdes, &args.name) {
        (Some(pdes), _) => db.get_neo_by_designation(pdes),
        (None, Some(name)) => db.get_neo_by_name(name),
        (None, None) => None,
    }
}

pub fn run(args: InspectArgs, db: &NeoDatabase, ctx: &Context) -> Result<()> {
    let Some(neo) = find(db, &args) else {
        eprintln!("No matching NEOs found in the database.");
        return Ok(());
    };

    let approaches: Vec<Approach<'_>> = if args.approaches {
        db.approaches_of(neo).collect()
    } else {
        Vec::new()
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match ctx.format {
        OutputFormat::Json => {
            let doc = InspectJson {
                neo: neo.to_record(),
                approaches: args
                    .approaches
                    .then(|| approaches.iter().map(Approach::to_record).collect()),
            };
            serde_json::to_writer_pretty(&mut out, &doc).into_diagnostic()?;
            writeln!(out).into_diagnostic()?;
        }
        OutputFormat::Csv if args.approaches => {
            write_approaches(&mut out, OutputFormat::Csv, &approaches)?;
        }
        OutputFormat::Csv => write_neos(&mut out, OutputFormat::Csv, &[neo])?,
        OutputFormat::Table => {
            write_neos(&mut out, OutputFormat::Table, &[neo])?;
            if args.approaches && !approaches.is_empty() {
                write_approaches(&mut out, OutputFormat::Table, &approaches)?;
            }
        }
        OutputFormat::Text => {
            writeln!(out, "{}", neo).into_diagnostic()?;
            if args.approaches {
                if !ctx.quiet {
                    writeln!(
                        out,
                        "{}:",
                        plural(approaches.len(), "close approach", "close approaches")
                    )
                    .into_diagnostic()?;
                }
                for approach in &approaches {
                    writeln!(out, "- {}", approach).into_diagnostic()?;
                }
            }
        }
    }

    Ok(())
}
