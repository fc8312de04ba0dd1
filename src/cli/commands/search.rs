//! `neo search` command - substring search over designations and names

use miette::Result;
use std::io;

use crate::cli::commands::utils::{plural, Context};
use crate::cli::output::write_neos;
use crate::cli::OutputFormat;
use crate::core::database::NeoDatabase;

#[derive(clap::Args, Debug, Clone)]
pub struct SearchArgs {
    /// Text to look for in designations and names (case-insensitive)
    pub query: String,

    /// Maximum number of results (0 for no limit)
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

pub fn run(args: SearchArgs, db: &NeoDatabase, ctx: &Context) -> Result<()> {
    let max = match ctx.limit(args.limit) {
        Some(0) | None => usize::MAX,
        Some(n) => n,
    };
    let matches = db.search_neos(&args.query, max);

    if matches.is_empty() {
        if !ctx.quiet {
            eprintln!("No NEOs match '{}'.", args.query.trim());
        }
        return Ok(());
    }

    if ctx.format == OutputFormat::Text && !ctx.quiet {
        println!(
            "Found {} matching '{}':",
            plural(matches.len(), "NEO", "NEOs"),
            args.query.trim()
        );
    }
    write_neos(io::stdout().lock(), ctx.format, &matches)
}
