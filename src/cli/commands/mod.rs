//! CLI command implementations

pub mod completions;
pub mod inspect;
pub mod interactive;
pub mod query;
pub mod rank;
pub mod search;
pub mod stats;
pub mod utils;
