//! NEO Explorer
//!
//! Loads a catalog of near-Earth objects and their close approaches to Earth
//! into an in-memory database, and answers lookups and filtered queries over it.

pub mod cli;
pub mod core;
