//! `neo interactive` command - start the shell

use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::utils::Context;
use crate::cli::shell::Shell;
use crate::core::database::NeoDatabase;

#[derive(clap::Args, Debug, Clone, Default)]
pub struct InteractiveArgs {
    /// End the session as soon as a data file is modified
    #[arg(long, short = 'a')]
    pub aggressive: bool,
}

pub fn run(
    args: InteractiveArgs,
    db: &NeoDatabase,
    ctx: &Context,
    data_files: Vec<PathBuf>,
) -> Result<()> {
    let mut shell = Shell::new(db, *ctx, data_files, args.aggressive);
    shell.run()
}
