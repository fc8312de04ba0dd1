//! Close approach filters
//!
//! A [`Filter`] compares one attribute of a close approach (or of the object
//! it is linked to) against a reference value. A [`CompositeFilter`] ANDs any
//! number of filters together; the empty composite matches everything.
//!
//! Filters on object attributes (diameter, hazardous) never match an approach
//! whose object is unknown.

use chrono::NaiveDate;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::model::Approach;

/// Date format accepted for date criteria
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Anything that can accept or reject a close approach
pub trait ApproachPredicate {
    fn matches(&self, approach: &Approach<'_>) -> bool;
}

/// Errors raised while building filters
#[derive(Debug, Error, Diagnostic, PartialEq)]
pub enum FilterError {
    #[error("unsupported filter criterion: {0}")]
    #[diagnostic(
        code(neo::filter::unsupported_criterion),
        help("supported criteria: date, start_date, end_date, min_distance, max_distance, min_velocity, max_velocity, min_diameter, max_diameter, hazardous")
    )]
    UnsupportedCriterion(String),

    #[error("unsupported comparison operator: {0}")]
    #[diagnostic(
        code(neo::filter::unsupported_operator),
        help("supported operators: eq, ne, lt, le, gt, ge")
    )]
    UnsupportedOperator(String),

    #[error("invalid value '{value}' for {criterion}: expected {expected}")]
    #[diagnostic(code(neo::filter::invalid_value))]
    InvalidValue {
        criterion: String,
        value: String,
        expected: &'static str,
    },
}

/// Binary comparison between an attribute and a reference value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn apply<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            Comparison::Eq => lhs == rhs,
            Comparison::Ne => lhs != rhs,
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Ge => lhs >= rhs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Ne => "ne",
            Comparison::Lt => "lt",
            Comparison::Le => "le",
            Comparison::Gt => "gt",
            Comparison::Ge => "ge",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Comparison {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eq" | "=" | "==" => Ok(Comparison::Eq),
            "ne" | "!=" => Ok(Comparison::Ne),
            "lt" | "<" => Ok(Comparison::Lt),
            "le" | "<=" => Ok(Comparison::Le),
            "gt" | ">" => Ok(Comparison::Gt),
            "ge" | ">=" => Ok(Comparison::Ge),
            _ => Err(FilterError::UnsupportedOperator(s.to_string())),
        }
    }
}

/// A single comparison against one approach attribute
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Filter {
    /// Calendar date of the approach (time of day ignored)
    Date { op: Comparison, value: NaiveDate },
    /// Approach distance in au
    Distance { op: Comparison, value: f64 },
    /// Relative velocity in km/s
    Velocity { op: Comparison, value: f64 },
    /// Diameter of the linked object in km
    Diameter { op: Comparison, value: f64 },
    /// Hazard flag of the linked object
    Hazardous { op: Comparison, value: bool },
}

impl Filter {
    pub fn matches(&self, approach: &Approach<'_>) -> bool {
        match *self {
            Filter::Date { op, value } => op.apply(approach.date(), value),
            Filter::Distance { op, value } => op.apply(approach.distance(), value),
            Filter::Velocity { op, value } => op.apply(approach.velocity(), value),
            Filter::Diameter { op, value } => approach
                .diameter()
                .is_some_and(|diameter| op.apply(diameter, value)),
            Filter::Hazardous { op, value } => approach
                .hazardous()
                .is_some_and(|hazardous| op.apply(hazardous, value)),
        }
    }

    /// Build a filter from its textual parts, e.g. `("distance", "lt", "0.05")`
    pub fn custom(kind: &str, operator: &str, value: &str) -> Result<Self, FilterError> {
        let op: Comparison = operator.parse()?;
        match kind.to_lowercase().as_str() {
            "date" => Ok(Filter::Date {
                op,
                value: parse_value(kind, value, parse_date, "a date (YYYY-MM-DD)")?,
            }),
            "distance" => Ok(Filter::Distance {
                op,
                value: parse_value(kind, value, parse_number, "a non-negative number")?,
            }),
            "velocity" => Ok(Filter::Velocity {
                op,
                value: parse_value(kind, value, parse_number, "a non-negative number")?,
            }),
            "diameter" => Ok(Filter::Diameter {
                op,
                value: parse_value(kind, value, parse_number, "a non-negative number")?,
            }),
            "hazardous" => Ok(Filter::Hazardous {
                op,
                value: parse_value(kind, value, parse_flag, "true or false")?,
            }),
            _ => Err(FilterError::UnsupportedCriterion(kind.to_string())),
        }
    }
}

impl ApproachPredicate for Filter {
    fn matches(&self, approach: &Approach<'_>) -> bool {
        Filter::matches(self, approach)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Date { op, value } => write!(f, "date {} {}", op, value),
            Filter::Distance { op, value } => write!(f, "distance {} {}", op, value),
            Filter::Velocity { op, value } => write!(f, "velocity {} {}", op, value),
            Filter::Diameter { op, value } => write!(f, "diameter {} {}", op, value),
            Filter::Hazardous { op, value } => write!(f, "hazardous {} {}", op, value),
        }
    }
}

/// Parses the `Display` form, e.g. `"velocity gt 20"` or `"diameter <= 1.5"`
impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.as_slice() {
            [kind, op, value] => Filter::custom(kind, op, value),
            _ => Err(FilterError::InvalidValue {
                criterion: "filter".to_string(),
                value: s.to_string(),
                expected: "'<kind> <operator> <value>'",
            }),
        }
    }
}

/// Named user criteria understood by [`QueryCriteria::set`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Date,
    StartDate,
    EndDate,
    MinDistance,
    MaxDistance,
    MinVelocity,
    MaxVelocity,
    MinDiameter,
    MaxDiameter,
    Hazardous,
}

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Date => "date",
            Criterion::StartDate => "start_date",
            Criterion::EndDate => "end_date",
            Criterion::MinDistance => "min_distance",
            Criterion::MaxDistance => "max_distance",
            Criterion::MinVelocity => "min_velocity",
            Criterion::MaxVelocity => "max_velocity",
            Criterion::MinDiameter => "min_diameter",
            Criterion::MaxDiameter => "max_diameter",
            Criterion::Hazardous => "hazardous",
        }
    }
}

impl FromStr for Criterion {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "date" => Ok(Criterion::Date),
            "start_date" => Ok(Criterion::StartDate),
            "end_date" => Ok(Criterion::EndDate),
            "min_distance" | "distance_min" => Ok(Criterion::MinDistance),
            "max_distance" | "distance_max" => Ok(Criterion::MaxDistance),
            "min_velocity" | "velocity_min" => Ok(Criterion::MinVelocity),
            "max_velocity" | "velocity_max" => Ok(Criterion::MaxVelocity),
            "min_diameter" | "diameter_min" => Ok(Criterion::MinDiameter),
            "max_diameter" | "diameter_max" => Ok(Criterion::MaxDiameter),
            "hazardous" => Ok(Criterion::Hazardous),
            _ => Err(FilterError::UnsupportedCriterion(s.to_string())),
        }
    }
}

/// Optional user criteria for a query
///
/// Every criterion that is `Some` becomes one filter. Contradictory bounds
/// are accepted and simply match nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryCriteria {
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_distance: Option<f64>,
    pub max_distance: Option<f64>,
    pub min_velocity: Option<f64>,
    pub max_velocity: Option<f64>,
    pub min_diameter: Option<f64>,
    pub max_diameter: Option<f64>,
    pub hazardous: Option<bool>,
}

impl QueryCriteria {
    /// Set a criterion by name, parsing `value` for its type
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), FilterError> {
        const DATE: &str = "a date (YYYY-MM-DD)";
        const NUMBER: &str = "a non-negative number";

        let criterion: Criterion = key.parse()?;
        let name = criterion.as_str();
        let date = || parse_value(name, value, parse_date, DATE).map(Some);
        let number = || parse_value(name, value, parse_number, NUMBER).map(Some);

        match criterion {
            Criterion::Date => self.date = date()?,
            Criterion::StartDate => self.start_date = date()?,
            Criterion::EndDate => self.end_date = date()?,
            Criterion::MinDistance => self.min_distance = number()?,
            Criterion::MaxDistance => self.max_distance = number()?,
            Criterion::MinVelocity => self.min_velocity = number()?,
            Criterion::MaxVelocity => self.max_velocity = number()?,
            Criterion::MinDiameter => self.min_diameter = number()?,
            Criterion::MaxDiameter => self.max_diameter = number()?,
            Criterion::Hazardous => {
                self.hazardous = Some(parse_value(name, value, parse_flag, "true or false")?)
            }
        }
        Ok(())
    }

    /// Build criteria from `(key, value)` pairs
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut criteria = Self::default();
        for (key, value) in pairs {
            criteria.set(key, value)?;
        }
        Ok(criteria)
    }

    /// True when no criterion is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Logical AND over an ordered list of filters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompositeFilter {
    filters: Vec<Filter>,
}

impl CompositeFilter {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    /// One filter per present criterion, always in the same order
    pub fn from_criteria(criteria: &QueryCriteria) -> Self {
        use Comparison::{Eq, Ge, Le};

        let mut filters = Vec::new();

        if let Some(value) = criteria.date {
            filters.push(Filter::Date { op: Eq, value });
        }
        if let Some(value) = criteria.start_date {
            filters.push(Filter::Date { op: Ge, value });
        }
        if let Some(value) = criteria.end_date {
            filters.push(Filter::Date { op: Le, value });
        }
        if let Some(value) = criteria.min_distance {
            filters.push(Filter::Distance { op: Ge, value });
        }
        if let Some(value) = criteria.max_distance {
            filters.push(Filter::Distance { op: Le, value });
        }
        if let Some(value) = criteria.min_velocity {
            filters.push(Filter::Velocity { op: Ge, value });
        }
        if let Some(value) = criteria.max_velocity {
            filters.push(Filter::Velocity { op: Le, value });
        }
        if let Some(value) = criteria.min_diameter {
            filters.push(Filter::Diameter { op: Ge, value });
        }
        if let Some(value) = criteria.max_diameter {
            filters.push(Filter::Diameter { op: Le, value });
        }
        if let Some(value) = criteria.hazardous {
            filters.push(Filter::Hazardous { op: Eq, value });
        }

        Self { filters }
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl ApproachPredicate for CompositeFilter {
    fn matches(&self, approach: &Approach<'_>) -> bool {
        self.filters.iter().all(|filter| filter.matches(approach))
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Parse a finite, non-negative number
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn parse_value<T>(
    criterion: &str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
    expected: &'static str,
) -> Result<T, FilterError> {
    parse(value).ok_or_else(|| FilterError::InvalidValue {
        criterion: criterion.to_string(),
        value: value.to_string(),
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{CloseApproach, NearEarthObject};

    fn approach_on(date: &str, hour: u32) -> CloseApproach {
        let time = parse_date(date).unwrap().and_hms_opt(hour, 0, 0).unwrap();
        CloseApproach::new("433", time, 0.1, 5.0)
    }

    fn eros() -> NearEarthObject {
        NearEarthObject::new("433", Some("Eros".to_string()), Some(16.84), false)
    }

    #[test]
    fn test_comparison_apply() {
        assert!(Comparison::Eq.apply(1.0, 1.0));
        assert!(Comparison::Ne.apply(1.0, 2.0));
        assert!(Comparison::Lt.apply(1.0, 2.0));
        assert!(Comparison::Le.apply(2.0, 2.0));
        assert!(Comparison::Gt.apply(3.0, 2.0));
        assert!(Comparison::Ge.apply(2.0, 2.0));
        assert!(!Comparison::Ge.apply(1.0, 2.0));
    }

    #[test]
    fn test_comparison_from_str() {
        assert_eq!("le".parse::<Comparison>().unwrap(), Comparison::Le);
        assert_eq!(">=".parse::<Comparison>().unwrap(), Comparison::Ge);
        assert_eq!(
            "between".parse::<Comparison>().unwrap_err(),
            FilterError::UnsupportedOperator("between".to_string())
        );
    }

    #[test]
    fn test_date_filter_ignores_time_of_day() {
        let neo = eros();
        let midnight = approach_on("2020-01-01", 0);
        let evening = approach_on("2020-01-01", 23);

        let on_day = Filter::Date {
            op: Comparison::Eq,
            value: parse_date("2020-01-01").unwrap(),
        };
        let next_day = Filter::Date {
            op: Comparison::Eq,
            value: parse_date("2020-01-02").unwrap(),
        };

        assert!(on_day.matches(&Approach::new(&midnight, Some(&neo))));
        assert!(on_day.matches(&Approach::new(&evening, Some(&neo))));
        assert!(!next_day.matches(&Approach::new(&midnight, Some(&neo))));
    }

    #[test]
    fn test_object_filters_are_false_when_unlinked() {
        let record = approach_on("2020-01-01", 0);
        let unlinked = Approach::new(&record, None);

        for filter in [
            Filter::Diameter { op: Comparison::Ge, value: 0.0 },
            Filter::Diameter { op: Comparison::Le, value: 1e9 },
            Filter::Hazardous { op: Comparison::Eq, value: true },
            Filter::Hazardous { op: Comparison::Eq, value: false },
        ] {
            assert!(!filter.matches(&unlinked), "{} matched an unlinked approach", filter);
        }
    }

    #[test]
    fn test_diameter_filter_false_when_unknown() {
        let record = approach_on("2020-01-01", 0);
        let neo = NearEarthObject::new("433", None, None, false);
        let filter = Filter::Diameter { op: Comparison::Le, value: 100.0 };
        assert!(!filter.matches(&Approach::new(&record, Some(&neo))));
    }

    #[test]
    fn test_hazardous_filter() {
        let record = approach_on("2020-01-01", 0);
        let safe = eros();
        let not_hazardous = Filter::Hazardous { op: Comparison::Eq, value: false };
        let hazardous = Filter::Hazardous { op: Comparison::Eq, value: true };
        assert!(not_hazardous.matches(&Approach::new(&record, Some(&safe))));
        assert!(!hazardous.matches(&Approach::new(&record, Some(&safe))));
    }

    #[test]
    fn test_empty_composite_matches_everything() {
        let record = approach_on("2020-01-01", 0);
        let everything = CompositeFilter::default();
        assert!(everything.is_empty());
        assert!(everything.matches(&Approach::new(&record, None)));
    }

    #[test]
    fn test_composite_is_conjunction() {
        let neo = eros();
        let record = approach_on("2020-01-01", 0);
        let approach = Approach::new(&record, Some(&neo));

        let both = CompositeFilter::new(vec![
            Filter::Distance { op: Comparison::Le, value: 0.2 },
            Filter::Velocity { op: Comparison::Ge, value: 4.0 },
        ]);
        assert!(both.matches(&approach));

        let contradictory = CompositeFilter::from_criteria(&QueryCriteria {
            min_distance: Some(0.5),
            max_distance: Some(0.05),
            ..Default::default()
        });
        assert!(!contradictory.matches(&approach));
    }

    #[test]
    fn test_from_criteria_order() {
        let criteria = QueryCriteria {
            hazardous: Some(true),
            max_distance: Some(0.1),
            date: parse_date("2020-03-02"),
            end_date: parse_date("2020-03-31"),
            start_date: parse_date("2020-03-01"),
            ..Default::default()
        };
        let composite = CompositeFilter::from_criteria(&criteria);
        let rendered: Vec<String> = composite.filters().iter().map(|f| f.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "date eq 2020-03-02",
                "date ge 2020-03-01",
                "date le 2020-03-31",
                "distance le 0.1",
                "hazardous eq true",
            ]
        );
    }

    #[test]
    fn test_exact_date_and_range_both_apply() {
        let neo = eros();
        let record = approach_on("2020-03-02", 0);
        let approach = Approach::new(&record, Some(&neo));

        let inside = CompositeFilter::from_criteria(&QueryCriteria {
            date: parse_date("2020-03-02"),
            start_date: parse_date("2020-03-01"),
            end_date: parse_date("2020-03-31"),
            ..Default::default()
        });
        assert!(inside.matches(&approach));

        let outside = CompositeFilter::from_criteria(&QueryCriteria {
            date: parse_date("2020-03-02"),
            start_date: parse_date("2020-04-01"),
            ..Default::default()
        });
        assert!(!outside.matches(&approach));
    }

    #[test]
    fn test_criteria_set_by_key() {
        let criteria = QueryCriteria::from_pairs([
            ("start-date", "2020-01-01"),
            ("max_distance", "0.025"),
            ("hazardous", "yes"),
        ])
        .unwrap();
        assert_eq!(criteria.start_date, parse_date("2020-01-01"));
        assert_eq!(criteria.max_distance, Some(0.025));
        assert_eq!(criteria.hazardous, Some(true));
        assert!(!criteria.is_empty());
    }

    #[test]
    fn test_unsupported_criterion() {
        let err = QueryCriteria::from_pairs([("brightness", "12")]).unwrap_err();
        assert_eq!(err, FilterError::UnsupportedCriterion("brightness".to_string()));

        let err = Filter::custom("albedo", "lt", "0.5").unwrap_err();
        assert_eq!(err, FilterError::UnsupportedCriterion("albedo".to_string()));
    }

    #[test]
    fn test_invalid_value() {
        let mut criteria = QueryCriteria::default();
        let err = criteria.set("date", "01/02/2020").unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidValue { ref criterion, .. } if criterion == "date"
        ));
    }

    #[test]
    fn test_custom_filter() {
        let filter = Filter::custom("velocity", "gt", "30").unwrap();
        assert_eq!(filter, Filter::Velocity { op: Comparison::Gt, value: 30.0 });

        let filter = Filter::custom("hazardous", "ne", "false").unwrap();
        assert_eq!(filter, Filter::Hazardous { op: Comparison::Ne, value: false });
    }

    #[test]
    fn test_filter_from_str() {
        let filter: Filter = "diameter <= 1.5".parse().unwrap();
        assert_eq!(filter, Filter::Diameter { op: Comparison::Le, value: 1.5 });

        let filter: Filter = "date eq 2020-01-01".parse().unwrap();
        assert_eq!(filter.to_string(), "date eq 2020-01-01");

        assert!("distance 0.1".parse::<Filter>().is_err());
        assert_eq!(
            "distance about 0.1".parse::<Filter>().unwrap_err(),
            FilterError::UnsupportedOperator("about".to_string())
        );
    }

    #[test]
    fn test_negative_and_non_finite_numbers_rejected() {
        let mut criteria = QueryCriteria::default();
        let rejected = [
            ("min_distance", "-1"),
            ("max_velocity", "NaN"),
            ("max_diameter", "inf"),
        ];
        for (key, value) in rejected {
            let err = criteria.set(key, value).unwrap_err();
            assert!(matches!(err, FilterError::InvalidValue { .. }), "{key}={value}");
        }
        assert!(criteria.is_empty());

        criteria.set("min_distance", "0").unwrap();
        assert_eq!(criteria.min_distance, Some(0.0));
        assert!(!criteria.is_empty());

        let err = Filter::custom("distance", "lt", "-2").unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidValue {
                criterion: "distance".to_string(),
                value: "-2".to_string(),
                expected: "a non-negative number",
            }
        );
    }
}
