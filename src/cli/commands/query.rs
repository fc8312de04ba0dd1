//! `neo query` command - filter close approaches

use chrono::NaiveDate;
use miette::Result;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::cli::commands::utils::{plural, Context};
use crate::cli::output::{write_approaches, write_to_path};
use crate::core::database::NeoDatabase;
use crate::core::filter::{parse_date, parse_number, CompositeFilter, Filter, QueryCriteria};
use crate::core::model::Approach;
use crate::core::query::limit;

#[derive(clap::Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Only approaches on this date (YYYY-MM-DD)
    #[arg(long, short = 'd', value_parser = date_arg)]
    pub date: Option<NaiveDate>,

    /// Only approaches on or after this date (YYYY-MM-DD)
    #[arg(long, short = 's', value_parser = date_arg)]
    pub start_date: Option<NaiveDate>,

    /// Only approaches on or before this date (YYYY-MM-DD)
    #[arg(long, short = 'e', value_parser = date_arg)]
    pub end_date: Option<NaiveDate>,

    /// Minimum approach distance in au
    #[arg(long, value_parser = non_negative)]
    pub min_distance: Option<f64>,

    /// Maximum approach distance in au
    #[arg(long, value_parser = non_negative)]
    pub max_distance: Option<f64>,

    /// Minimum relative velocity in km/s
    #[arg(long, value_parser = non_negative)]
    pub min_velocity: Option<f64>,

    /// Maximum relative velocity in km/s
    #[arg(long, value_parser = non_negative)]
    pub max_velocity: Option<f64>,

    /// Minimum NEO diameter in km
    #[arg(long, value_parser = non_negative)]
    pub min_diameter: Option<f64>,

    /// Maximum NEO diameter in km
    #[arg(long, value_parser = non_negative)]
    pub max_diameter: Option<f64>,

    /// Only approaches of potentially hazardous NEOs
    #[arg(long, conflicts_with = "not_hazardous")]
    pub hazardous: bool,

    /// Only approaches of NEOs that are not potentially hazardous
    #[arg(long)]
    pub not_hazardous: bool,

    /// Extra filter as '<kind> <op> <value>', e.g. 'velocity gt 20' (repeatable)
    #[arg(long = "where", short = 'w', value_name = "FILTER")]
    pub filters: Vec<Filter>,

    /// Maximum number of results (0 for no limit)
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,

    /// Save results to a .csv or .json file instead of printing them
    #[arg(long, short = 'o')]
    pub outfile: Option<PathBuf>,
}

fn date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date '{}': expected YYYY-MM-DD", s))
}

fn non_negative(s: &str) -> Result<f64, String> {
    parse_number(s).ok_or_else(|| format!("invalid value '{}': expected a non-negative number", s))
}

impl QueryArgs {
    pub fn criteria(&self) -> QueryCriteria {
        let hazardous = match (self.hazardous, self.not_hazardous) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        };
        QueryCriteria {
            date: self.date,
            start_date: self.start_date,
            end_date: self.end_date,
            min_distance: self.min_distance,
            max_distance: self.max_distance,
            min_velocity: self.min_velocity,
            max_velocity: self.max_velocity,
            min_diameter: self.min_diameter,
            max_diameter: self.max_diameter,
            hazardous,
        }
    }

    /// Criteria filters first, then any `--where` filters
    pub fn filter(&self) -> CompositeFilter {
        let mut filter = CompositeFilter::from_criteria(&self.criteria());
        for extra in &self.filters {
            filter.push(*extra);
        }
        filter
    }
}

/// Run the query and collect at most the requested number of results
pub fn collect<'a>(
    db: &'a NeoDatabase,
    filter: &'a CompositeFilter,
    max: Option<usize>,
) -> Vec<Approach<'a>> {
    limit(db.query(filter), max).collect()
}

pub fn run(args: QueryArgs, db: &NeoDatabase, ctx: &Context) -> Result<()> {
    let filter = args.filter();
    if args.criteria().is_empty() && args.filters.is_empty() {
        info!("no filters given; every close approach matches");
    } else {
        debug!(filters = ?filter.filters(), "running query");
    }

    let results = collect(db, &filter, ctx.limit(args.limit));

    if let Some(path) = &args.outfile {
        write_to_path(path, &results)?;
        if !ctx.quiet {
            println!(
                "Saved {} to {}",
                plural(results.len(), "close approach", "close approaches"),
                path.display()
            );
        }
        return Ok(());
    }

    if results.is_empty() {
        if !ctx.quiet {
            eprintln!("No close approaches match the given criteria.");
        }
        return Ok(());
    }

    write_approaches(io::stdout().lock(), ctx.format, &results)
}
