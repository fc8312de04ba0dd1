//! `neo closest`, `neo fastest` and `neo recent` - ranked views of all approaches

use miette::Result;
use std::io;

use crate::cli::commands::utils::Context;
use crate::cli::output::write_approaches;
use crate::core::database::NeoDatabase;
use crate::core::query::{rank, RankOrder};

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RankArgs {
    /// Number of approaches to show (0 for all)
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

pub fn run(order: RankOrder, args: RankArgs, db: &NeoDatabase, ctx: &Context) -> Result<()> {
    let ranked = rank(db.approaches(), order, ctx.limit(args.limit));

    if ranked.is_empty() {
        if !ctx.quiet {
            eprintln!("The database holds no close approaches.");
        }
        return Ok(());
    }

    write_approaches(io::stdout().lock(), ctx.format, &ranked)
}
