//! In-memory NEO database
//!
//! This module owns the loaded catalog and provides:
//! - O(1) lookup by primary designation (exact) and by name (case-insensitive)
//! - Linking of close approaches to the object they belong to
//! - Lazy, order-preserving queries over all close approaches
//!
//! The database is built once and is read-only afterward. Approaches keep the
//! order in which the loader supplied them.

use miette::Diagnostic;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::filter::ApproachPredicate;
use crate::core::model::{Approach, CloseApproach, NearEarthObject};

/// Options controlling database construction
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseOptions {
    /// Fail construction when an approach references an unknown designation
    pub strict: bool,
}

/// Database statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub total_neos: usize,
    pub total_approaches: usize,
    pub hazardous_neos: usize,
    pub named_neos: usize,
    pub neos_with_diameter: usize,
    pub unlinked_approaches: usize,
}

/// Errors raised while building the database
#[derive(Debug, Error, Diagnostic)]
pub enum DatabaseError {
    #[error("duplicate designation '{designation}' in NEO catalog")]
    #[diagnostic(
        code(neo::database::duplicate_designation),
        help("every NEO record must have a unique primary designation")
    )]
    DuplicateDesignation { designation: String },

    #[error("close approach #{index} references unknown designation '{designation}'")]
    #[diagnostic(
        code(neo::database::unresolved_link),
        help("run without --strict to keep unresolved approaches as unlinked records")
    )]
    UnresolvedLink { designation: String, index: usize },
}

/// A catalog of near-Earth objects and their close approaches
#[derive(Debug)]
pub struct NeoDatabase {
    neos: Vec<NearEarthObject>,
    approaches: Vec<CloseApproach>,
    /// designation -> position in `neos`
    by_designation: HashMap<String, usize>,
    /// lowercase name -> position in `neos`
    by_name: HashMap<String, usize>,
    stats: DatabaseStats,
}

impl NeoDatabase {
    /// Build a database in lenient mode
    pub fn new(
        neos: Vec<NearEarthObject>,
        approaches: Vec<CloseApproach>,
    ) -> Result<Self, DatabaseError> {
        Self::with_options(neos, approaches, DatabaseOptions::default())
    }

    /// Build indexes and link every approach to its object
    ///
    /// Duplicate designations always fail. An approach whose designation does
    /// not resolve fails in strict mode; otherwise it is kept unlinked and a
    /// warning is logged.
    pub fn with_options(
        mut neos: Vec<NearEarthObject>,
        mut approaches: Vec<CloseApproach>,
        options: DatabaseOptions,
    ) -> Result<Self, DatabaseError> {
        let mut by_designation = HashMap::with_capacity(neos.len());
        let mut by_name = HashMap::new();

        for (idx, neo) in neos.iter_mut().enumerate() {
            neo.approaches.clear();

            if by_designation.insert(neo.designation.clone(), idx).is_some() {
                return Err(DatabaseError::DuplicateDesignation {
                    designation: neo.designation.clone(),
                });
            }

            if let Some(name) = &neo.name {
                // First object wins if two names differ only by case
                by_name.entry(name.to_lowercase()).or_insert(idx);
            }
        }

        let mut unlinked_approaches = 0;
        for (idx, approach) in approaches.iter_mut().enumerate() {
            match by_designation.get(&approach.designation) {
                Some(&neo_idx) => {
                    approach.neo = Some(neo_idx);
                    neos[neo_idx].approaches.push(idx);
                }
                None if options.strict => {
                    return Err(DatabaseError::UnresolvedLink {
                        designation: approach.designation.clone(),
                        index: idx,
                    });
                }
                None => {
                    approach.neo = None;
                    unlinked_approaches += 1;
                    warn!(
                        designation = %approach.designation,
                        index = idx,
                        "close approach references an unknown NEO; keeping it unlinked"
                    );
                }
            }
        }

        let stats = DatabaseStats {
            total_neos: neos.len(),
            total_approaches: approaches.len(),
            hazardous_neos: neos.iter().filter(|n| n.hazardous).count(),
            named_neos: neos.iter().filter(|n| n.name.is_some()).count(),
            neos_with_diameter: neos.iter().filter(|n| n.has_diameter()).count(),
            unlinked_approaches,
        };

        info!(
            neos = stats.total_neos,
            approaches = stats.total_approaches,
            unlinked = stats.unlinked_approaches,
            "database initialized"
        );

        Ok(Self {
            neos,
            approaches,
            by_designation,
            by_name,
            stats,
        })
    }

    /// Find an object by its primary designation (exact match)
    pub fn get_neo_by_designation(&self, designation: &str) -> Option<&NearEarthObject> {
        self.by_designation
            .get(designation)
            .map(|&idx| &self.neos[idx])
    }

    /// Find an object by its name (case-insensitive)
    pub fn get_neo_by_name(&self, name: &str) -> Option<&NearEarthObject> {
        let key = name.trim();
        if key.is_empty() {
            return None;
        }
        self.by_name
            .get(&key.to_lowercase())
            .map(|&idx| &self.neos[idx])
    }

    /// All objects, in load order
    pub fn neos(&self) -> impl Iterator<Item = &NearEarthObject> {
        self.neos.iter()
    }

    /// All close approaches, in load order
    pub fn approaches(&self) -> impl Iterator<Item = Approach<'_>> {
        self.approaches.iter().map(move |record| self.view(record))
    }

    /// Close approaches linked to `neo`, in load order
    pub fn approaches_of<'a>(
        &'a self,
        neo: &'a NearEarthObject,
    ) -> impl Iterator<Item = Approach<'a>> + 'a {
        neo.approaches
            .iter()
            .filter_map(move |&idx| self.approaches.get(idx))
            .map(move |record| self.view(record))
    }

    /// Lazily yield the approaches that satisfy `predicate`, in load order
    ///
    /// Nothing is evaluated until the iterator is pulled, so callers can stop
    /// early (see [`crate::core::query::limit`]). Each call starts a fresh scan.
    pub fn query<'a, P>(&'a self, predicate: &'a P) -> impl Iterator<Item = Approach<'a>> + 'a
    where
        P: ApproachPredicate + ?Sized,
    {
        self.approaches()
            .filter(move |approach| predicate.matches(approach))
    }

    /// Search objects whose designation or name contains `query`
    ///
    /// Designation matches come first, then name matches; each object is
    /// returned at most once. Matching is case-insensitive.
    pub fn search_neos(&self, query: &str, limit: usize) -> Vec<&NearEarthObject> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Vec::new();
        }

        let by_designation = self
            .neos
            .iter()
            .filter(|neo| neo.designation.to_lowercase().contains(&needle));
        let by_name = self.neos.iter().filter(|neo| {
            !neo.designation.to_lowercase().contains(&needle)
                && neo
                    .name
                    .as_ref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
        });

        let results: Vec<_> = by_designation.chain(by_name).take(limit).collect();
        debug!(query, matches = results.len(), "searched NEOs");
        results
    }

    pub fn statistics(&self) -> &DatabaseStats {
        &self.stats
    }

    /// Number of close approaches
    pub fn len(&self) -> usize {
        self.approaches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approaches.is_empty()
    }

    fn view<'a>(&'a self, record: &'a CloseApproach) -> Approach<'a> {
        Approach::new(record, record.neo.and_then(|idx| self.neos.get(idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::{CompositeFilter, QueryCriteria};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn neo(
        designation: &str,
        name: Option<&str>,
        diameter: Option<f64>,
        hazardous: bool,
    ) -> NearEarthObject {
        NearEarthObject::new(designation, name.map(String::from), diameter, hazardous)
    }

    fn sample_db() -> NeoDatabase {
        let neos = vec![
            neo("433", Some("Eros"), Some(16.84), false),
            neo("2101", Some("Adonis"), Some(0.6), true),
            neo("2019 SC8", None, None, false),
        ];
        let approaches = vec![
            CloseApproach::new("433", at("2020-01-01"), 0.1, 5.0),
            CloseApproach::new("2101", at("2020-03-02"), 0.03, 22.0),
            CloseApproach::new("433", at("2020-06-10"), 0.3, 6.5),
            CloseApproach::new("2019 SC8", at("2020-07-04"), 0.01, 10.0),
        ];
        NeoDatabase::new(neos, approaches).unwrap()
    }

    #[test]
    fn test_get_neo_by_designation() {
        let db = sample_db();
        assert_eq!(db.get_neo_by_designation("433").unwrap().fullname(), "433 (Eros)");
        assert!(db.get_neo_by_designation("2019 SC8").is_some());
        assert!(db.get_neo_by_designation("9999").is_none());
        // exact match only
        assert!(db.get_neo_by_designation("2019 sc8").is_none());
    }

    #[test]
    fn test_get_neo_by_name_is_case_insensitive() {
        let db = sample_db();
        let upper = db.get_neo_by_name("Eros").unwrap();
        let lower = db.get_neo_by_name("eros").unwrap();
        assert_eq!(upper.designation, lower.designation);
        assert_eq!(db.get_neo_by_name("ADONIS").unwrap().designation, "2101");
    }

    #[test]
    fn test_get_neo_by_name_rejects_empty_and_unknown() {
        let db = sample_db();
        assert!(db.get_neo_by_name("").is_none());
        assert!(db.get_neo_by_name("   ").is_none());
        assert!(db.get_neo_by_name("433").is_none());
        assert!(db.get_neo_by_name("Halley").is_none());
    }

    #[test]
    fn test_linking_populates_back_references() {
        let db = sample_db();
        let eros = db.get_neo_by_designation("433").unwrap();
        assert_eq!(eros.approach_count(), 2);

        let times: Vec<_> = db.approaches_of(eros).map(|a| a.record().time_str()).collect();
        assert_eq!(times, vec!["2020-01-01 00:00", "2020-06-10 00:00"]);

        for approach in db.approaches() {
            assert_eq!(approach.neo().unwrap().designation, approach.designation());
        }
    }

    #[test]
    fn test_every_approach_belongs_to_exactly_one_neo() {
        let db = sample_db();
        let linked: usize = db.neos().map(|n| n.approach_count()).sum();
        assert_eq!(linked, db.len());
    }

    #[test]
    fn test_duplicate_designation_fails() {
        let neos = vec![neo("1", None, None, false), neo("1", Some("Ceres"), None, false)];
        let err = NeoDatabase::new(neos, vec![]).unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::DuplicateDesignation { ref designation } if designation == "1"
        ));
    }

    #[test]
    fn test_unresolved_link_lenient_keeps_approach() {
        let neos = vec![neo("433", Some("Eros"), Some(16.84), true)];
        let approaches = vec![
            CloseApproach::new("433", at("2020-01-01"), 0.1, 5.0),
            CloseApproach::new("999", at("2020-01-02"), 0.2, 7.0),
        ];
        let db = NeoDatabase::new(neos, approaches).unwrap();

        assert_eq!(db.statistics().total_approaches, 2);
        assert_eq!(db.statistics().unlinked_approaches, 1);

        let hazardous = CompositeFilter::from_criteria(&QueryCriteria {
            hazardous: Some(true),
            ..Default::default()
        });
        let designations: Vec<_> = db.query(&hazardous).map(|a| a.designation()).collect();
        assert_eq!(designations, vec!["433"]);

        // still visible to distance queries
        let far = CompositeFilter::from_criteria(&QueryCriteria {
            min_distance: Some(0.15),
            ..Default::default()
        });
        let designations: Vec<_> = db.query(&far).map(|a| a.designation()).collect();
        assert_eq!(designations, vec!["999"]);
    }

    #[test]
    fn test_unresolved_link_strict_fails() {
        let neos = vec![neo("433", None, None, false)];
        let approaches = vec![CloseApproach::new("999", at("2020-01-02"), 0.2, 7.0)];
        let err = NeoDatabase::with_options(neos, approaches, DatabaseOptions { strict: true })
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UnresolvedLink { index: 0, .. }));
    }

    #[test]
    fn test_statistics() {
        let db = sample_db();
        let stats = db.statistics();
        assert_eq!(stats.total_neos, 3);
        assert_eq!(stats.total_approaches, 4);
        assert_eq!(stats.hazardous_neos, 1);
        assert_eq!(stats.named_neos, 2);
        assert_eq!(stats.neos_with_diameter, 2);
        assert_eq!(stats.unlinked_approaches, 0);
    }

    #[test]
    fn test_query_empty_filter_matches_everything_in_order() {
        let db = sample_db();
        let everything = CompositeFilter::default();
        let designations: Vec<_> = db.query(&everything).map(|a| a.designation()).collect();
        assert_eq!(designations, vec!["433", "2101", "433", "2019 SC8"]);
    }

    #[test]
    fn test_query_is_restartable() {
        let db = sample_db();
        let filter = CompositeFilter::from_criteria(&QueryCriteria {
            max_distance: Some(0.1),
            ..Default::default()
        });
        assert_eq!(db.query(&filter).count(), 3);
        assert_eq!(db.query(&filter).count(), 3);
    }

    #[test]
    fn test_eros_scenario() {
        let neos = vec![neo("433", Some("Eros"), Some(16.84), false)];
        let approaches = vec![CloseApproach::new("433", at("2020-01-01"), 0.1, 5.0)];
        let db = NeoDatabase::new(neos, approaches).unwrap();

        let near = CompositeFilter::from_criteria(&QueryCriteria {
            max_distance: Some(0.2),
            ..Default::default()
        });
        let results: Vec<_> = db.query(&near).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].designation(), "433");

        let nearer = CompositeFilter::from_criteria(&QueryCriteria {
            max_distance: Some(0.05),
            ..Default::default()
        });
        assert_eq!(db.query(&nearer).count(), 0);
    }

    #[test]
    fn test_search_neos() {
        let db = sample_db();

        let results = db.search_neos("eros", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].designation, "433");

        // "2" matches designations 2101 and 2019 SC8 before any name
        let results: Vec<_> = db
            .search_neos("2", 10)
            .into_iter()
            .map(|n| n.designation.as_str())
            .collect();
        assert_eq!(results, vec!["2101", "2019 SC8"]);

        assert_eq!(db.search_neos("2", 1).len(), 1);
        assert!(db.search_neos("", 10).is_empty());
    }
}
