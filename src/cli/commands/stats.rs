//! `neo stats` command - database statistics

use miette::{IntoDiagnostic, Result};
use std::io::{self, Write};
use tabled::{builder::Builder, settings::Style};

use crate::cli::commands::utils::Context;
use crate::cli::OutputFormat;
use crate::core::database::{DatabaseStats, NeoDatabase};

#[derive(clap::Args, Debug, Clone, Default)]
pub struct StatsArgs {}

/// Label/value rows shown by the text and table formats
pub fn rows(stats: &DatabaseStats) -> Vec<(&'static str, String)> {
    vec![
        ("NEOs", stats.total_neos.to_string()),
        ("Named NEOs", stats.named_neos.to_string()),
        ("NEOs with known diameter", stats.neos_with_diameter.to_string()),
        ("Potentially hazardous NEOs", stats.hazardous_neos.to_string()),
        ("Close approaches", stats.total_approaches.to_string()),
        ("Unlinked close approaches", stats.unlinked_approaches.to_string()),
    ]
}

pub fn run(_args: StatsArgs, db: &NeoDatabase, ctx: &Context) -> Result<()> {
    let stats = db.statistics();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match ctx.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, stats).into_diagnostic()?;
            writeln!(out).into_diagnostic()?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            wtr.write_record(["metric", "value"]).into_diagnostic()?;
            for (label, value) in rows(stats) {
                wtr.write_record([label, value.as_str()]).into_diagnostic()?;
            }
            wtr.flush().into_diagnostic()?;
        }
        OutputFormat::Text | OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["Metric", "Count"]);
            for (label, value) in rows(stats) {
                builder.push_record([label.to_string(), value]);
            }
            writeln!(out, "{}", builder.build().with(Style::rounded())).into_diagnostic()?;
        }
    }

    Ok(())
}
