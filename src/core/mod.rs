//! Core module - catalog model, database, filters and loading

pub mod config;
pub mod database;
pub mod filter;
pub mod loader;
pub mod model;
pub mod query;

pub use config::Config;
pub use database::{DatabaseError, DatabaseOptions, DatabaseStats, NeoDatabase};
pub use filter::{
    ApproachPredicate, Comparison, CompositeFilter, Filter, FilterError, QueryCriteria,
};
pub use loader::{load_database, LoadError, LoadOptions, LoadStats};
pub use model::{Approach, ApproachRecord, CloseApproach, NearEarthObject, NeoRecord};
pub use query::{limit, rank, Limit, RankOrder};
