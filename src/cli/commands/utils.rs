//! Shared utilities for CLI commands

use miette::Result;
use tracing::info;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::database::NeoDatabase;
use crate::core::loader::{load_database, LoadOptions};

/// Settings every command needs once the database is open
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub format: OutputFormat,
    /// Limit applied when a command is not given `--limit`
    pub default_limit: usize,
    pub quiet: bool,
}

impl Context {
    pub fn new(global: &GlobalOpts, config: &Config) -> Self {
        let format = global
            .format
            .or_else(|| {
                config
                    .default_format
                    .as_deref()
                    .and_then(|f| f.parse::<OutputFormat>().ok())
            })
            .unwrap_or_default();

        Self {
            format,
            default_limit: config.limit(),
            quiet: global.quiet,
        }
    }

    /// Resolve a command's `--limit` against the configured default
    pub fn limit(&self, requested: Option<usize>) -> Option<usize> {
        Some(requested.unwrap_or(self.default_limit))
    }
}

/// Load layered configuration and apply command-line overrides on top
pub fn resolve_config(global: &GlobalOpts) -> Config {
    let mut config = Config::load();
    config.merge(Config {
        neofile: global.neofile.clone(),
        cadfile: global.cadfile.clone(),
        strict: global.strict.then_some(true),
        ..Default::default()
    });
    config
}

/// Load both data files and build the database
pub fn open_database(config: &Config) -> Result<NeoDatabase> {
    let neofile = config.neofile();
    let cadfile = config.cadfile();
    info!(neofile = %neofile.display(), cadfile = %cadfile.display(), "loading NEO database");

    let db = load_database(
        &neofile,
        &cadfile,
        LoadOptions {
            strict: config.strict(),
        },
    )?;
    Ok(db)
}

/// "approach" or "approaches" style pluralization used in summaries
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
