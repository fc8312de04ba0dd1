//! Near-Earth objects and their close approaches to Earth
//!
//! The database owns every record. A close approach refers to its object by
//! position in the database's object list, and [`Approach`] is the borrowed
//! view that pairs an approach with the object it resolved to.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// Display format for approach times (UTC)
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A near-Earth object (asteroid or comet)
#[derive(Debug, Clone, PartialEq)]
pub struct NearEarthObject {
    /// Primary designation, unique across the catalog
    pub designation: String,

    /// IAU name, if the object has one
    pub name: Option<String>,

    /// Diameter in kilometers, if known
    pub diameter: Option<f64>,

    /// Whether the object is flagged potentially hazardous
    pub hazardous: bool,

    /// Positions of this object's approaches in the database (filled by linking)
    pub(crate) approaches: Vec<usize>,
}

impl NearEarthObject {
    /// Create an object with no linked approaches
    ///
    /// Blank names collapse to `None`, and a NaN or negative diameter is
    /// treated as unknown.
    pub fn new(
        designation: impl Into<String>,
        name: Option<String>,
        diameter: Option<f64>,
        hazardous: bool,
    ) -> Self {
        Self {
            designation: designation.into(),
            name: name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            diameter: diameter.filter(|d| !d.is_nan() && *d >= 0.0),
            hazardous,
            approaches: Vec::new(),
        }
    }

    /// Designation plus name, e.g. "433 (Eros)"
    pub fn fullname(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", self.designation, name),
            None => self.designation.clone(),
        }
    }

    pub fn has_diameter(&self) -> bool {
        self.diameter.is_some()
    }

    /// Number of close approaches linked to this object
    pub fn approach_count(&self) -> usize {
        self.approaches.len()
    }

    /// Flat key-value mapping used by the CSV and JSON writers
    pub fn to_record(&self) -> NeoRecord {
        NeoRecord {
            designation: self.designation.clone(),
            name: self.name.clone().unwrap_or_default(),
            diameter_km: self.diameter.unwrap_or(f64::NAN),
            potentially_hazardous: self.hazardous,
        }
    }
}

impl fmt::Display for NearEarthObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.hazardous { "is" } else { "is not" };
        match self.diameter {
            Some(diameter) => write!(
                f,
                "NEO {} has a diameter of {:.3} km and {} potentially hazardous.",
                self.fullname(),
                diameter,
                verb
            ),
            None => write!(f, "NEO {} {} potentially hazardous.", self.fullname(), verb),
        }
    }
}

/// A single close approach of an object to Earth
#[derive(Debug, Clone, PartialEq)]
pub struct CloseApproach {
    /// Designation of the object making the approach
    pub designation: String,

    /// Time of closest approach (UTC)
    pub time: NaiveDateTime,

    /// Nominal approach distance in astronomical units
    pub distance: f64,

    /// Relative approach velocity in km/s
    pub velocity: f64,

    /// Position of the linked object in the database, if linking succeeded
    pub(crate) neo: Option<usize>,
}

impl CloseApproach {
    pub fn new(
        designation: impl Into<String>,
        time: NaiveDateTime,
        distance: f64,
        velocity: f64,
    ) -> Self {
        Self {
            designation: designation.into(),
            time,
            distance,
            velocity,
            neo: None,
        }
    }

    /// Calendar date of the approach
    pub fn date(&self) -> NaiveDate {
        self.time.date()
    }

    pub fn time_str(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

/// A close approach together with the object it belongs to
#[derive(Debug, Clone, Copy)]
pub struct Approach<'db> {
    record: &'db CloseApproach,
    neo: Option<&'db NearEarthObject>,
}

impl<'db> Approach<'db> {
    pub(crate) fn new(record: &'db CloseApproach, neo: Option<&'db NearEarthObject>) -> Self {
        Self { record, neo }
    }

    pub fn record(&self) -> &'db CloseApproach {
        self.record
    }

    /// The linked object, or `None` for an unresolved approach
    pub fn neo(&self) -> Option<&'db NearEarthObject> {
        self.neo
    }

    pub fn designation(&self) -> &'db str {
        &self.record.designation
    }

    pub fn time(&self) -> NaiveDateTime {
        self.record.time
    }

    pub fn date(&self) -> NaiveDate {
        self.record.date()
    }

    pub fn distance(&self) -> f64 {
        self.record.distance
    }

    pub fn velocity(&self) -> f64 {
        self.record.velocity
    }

    /// Diameter of the linked object, `None` if unlinked or unknown
    pub fn diameter(&self) -> Option<f64> {
        self.neo.and_then(|neo| neo.diameter)
    }

    /// Hazard flag of the linked object, `None` if unlinked
    pub fn hazardous(&self) -> Option<bool> {
        self.neo.map(|neo| neo.hazardous)
    }

    /// Nested key-value mapping used by the CSV and JSON writers
    pub fn to_record(&self) -> ApproachRecord {
        ApproachRecord {
            datetime_utc: self.record.time_str(),
            distance_au: self.record.distance,
            velocity_km_s: self.record.velocity,
            neo: match self.neo {
                Some(neo) => neo.to_record(),
                None => NeoRecord::unlinked(&self.record.designation),
            },
        }
    }
}

impl fmt::Display for Approach<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = match self.neo {
            Some(neo) => neo.fullname(),
            None => format!("'{}'", self.record.designation),
        };
        write!(
            f,
            "At {}, {} approaches Earth at a distance of {:.2} au and a velocity of {:.2} km/s.",
            self.record.time_str(),
            who,
            self.record.distance,
            self.record.velocity
        )
    }
}

/// Serialized form of a near-Earth object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeoRecord {
    pub designation: String,
    pub name: String,
    /// NaN when the diameter is unknown
    pub diameter_km: f64,
    pub potentially_hazardous: bool,
}

impl NeoRecord {
    /// Placeholder mapping for an approach whose object could not be resolved
    pub fn unlinked(designation: &str) -> Self {
        Self {
            designation: designation.to_string(),
            name: String::new(),
            diameter_km: f64::NAN,
            potentially_hazardous: false,
        }
    }
}

/// Serialized form of a close approach
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApproachRecord {
    pub datetime_utc: String,
    pub distance_au: f64,
    pub velocity_km_s: f64,
    pub neo: NeoRecord,
}
