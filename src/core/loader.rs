//! Data file loading
//!
//! Reads the two source files into typed records:
//! - the NEO catalog, a CSV file with `pdes`, `name`, `diameter` and `pha` columns
//! - the close approach data, a JSON document `{"fields": [...], "data": [[...], ...]}`
//!
//! In lenient mode malformed rows are skipped and counted; in strict mode the
//! first malformed row aborts the load.

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use miette::Diagnostic;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::database::{DatabaseError, DatabaseOptions, NeoDatabase};
use crate::core::model::{CloseApproach, NearEarthObject};

/// Fixed column positions used when the approach file has no `fields` header
const DEFAULT_APPROACH_COLUMNS: ApproachColumns = ApproachColumns {
    designation: 0,
    time: 3,
    distance: 4,
    velocity: 7,
};

/// Options controlling how strictly the loader treats bad rows
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Fail on the first malformed row (and on unresolved approaches)
    pub strict: bool,
}

/// Counters collected while loading a file
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: usize,
    pub records_loaded: usize,
    /// Rows without a designation
    pub skipped: usize,
    /// Rows with unparseable values (lenient mode only)
    pub parse_errors: usize,
}

/// Errors raised while loading data files
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("data file not found: {}", path.display())]
    #[diagnostic(
        code(neo::loader::not_found),
        help("pass --neofile/--cadfile or set them in neo.yaml")
    )]
    NotFound { path: PathBuf },

    #[error("failed to read {}", path.display())]
    #[diagnostic(code(neo::loader::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV file {}", path.display())]
    #[diagnostic(code(neo::loader::csv))]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse JSON file {}", path.display())]
    #[diagnostic(code(neo::loader::json))]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid structure in {}: {message}", path.display())]
    #[diagnostic(code(neo::loader::invalid_structure))]
    InvalidStructure { path: PathBuf, message: String },

    #[error("malformed row {row} in {}: {message}", path.display())]
    #[diagnostic(
        code(neo::loader::malformed_row),
        help("run without --strict to skip malformed rows")
    )]
    MalformedRow {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),
}

/// Raw close approach document as published by the JPL SBDB API
#[derive(Debug, Deserialize)]
struct CadDocument {
    #[serde(default)]
    fields: Option<Vec<String>>,
    data: Vec<Vec<JsonValue>>,
}

#[derive(Debug, Clone, Copy)]
struct ApproachColumns {
    designation: usize,
    time: usize,
    distance: usize,
    velocity: usize,
}

impl ApproachColumns {
    fn from_fields(fields: &[String]) -> Option<Self> {
        let position = |name: &str| fields.iter().position(|f| f.trim() == name);
        Some(Self {
            designation: position("des")?,
            time: position("cd")?,
            distance: position("dist")?,
            velocity: position("v_rel")?,
        })
    }
}

/// Load the NEO catalog from a CSV file
pub fn load_neos(
    path: &Path,
    options: LoadOptions,
) -> Result<(Vec<NearEarthObject>, LoadStats), LoadError> {
    let file = open(path)?;
    let result = read_neos(file, path, options)?;
    info!(
        path = %path.display(),
        loaded = result.1.records_loaded,
        errors = result.1.parse_errors,
        "loaded NEOs"
    );
    Ok(result)
}

/// Load close approaches from a JSON file
pub fn load_approaches(
    path: &Path,
    options: LoadOptions,
) -> Result<(Vec<CloseApproach>, LoadStats), LoadError> {
    let file = open(path)?;
    let result = read_approaches(BufReader::new(file), path, options)?;
    info!(
        path = %path.display(),
        loaded = result.1.records_loaded,
        errors = result.1.parse_errors,
        "loaded close approaches"
    );
    Ok(result)
}

/// Load both files and build the database
pub fn load_database(
    neo_path: &Path,
    cad_path: &Path,
    options: LoadOptions,
) -> Result<NeoDatabase, LoadError> {
    let (neos, _) = load_neos(neo_path, options)?;
    let (approaches, _) = load_approaches(cad_path, options)?;
    let db = NeoDatabase::with_options(
        neos,
        approaches,
        DatabaseOptions {
            strict: options.strict,
        },
    )?;
    Ok(db)
}

/// Read NEO records from any CSV source
///
/// `source` is only used in error messages.
pub fn read_neos<R: Read>(
    reader: R,
    source: &Path,
    options: LoadOptions,
) -> Result<(Vec<NearEarthObject>, LoadStats), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| csv_error(source, e))?.clone();
    let header_map = build_header_map(&headers);
    if !header_map.contains_key("pdes") {
        return Err(LoadError::InvalidStructure {
            path: source.to_path_buf(),
            message: "missing 'pdes' column".to_string(),
        });
    }

    let mut neos = Vec::new();
    let mut stats = LoadStats::default();

    for (idx, result) in rdr.records().enumerate() {
        // header is row 1
        let row = idx + 2;
        stats.rows_read += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                reject(&mut stats, source, row, e.to_string(), options)?;
                continue;
            }
        };

        let Some(designation) = get_field(&record, &header_map, "pdes") else {
            stats.skipped += 1;
            continue;
        };

        let name = get_field(&record, &header_map, "name");
        let diameter = get_field(&record, &header_map, "diameter").and_then(|d| {
            let parsed = d.parse::<f64>().ok();
            if parsed.is_none() {
                debug!(row, value = %d, "ignoring unparseable diameter");
            }
            parsed
        });
        let hazardous = get_field(&record, &header_map, "pha")
            .is_some_and(|flag| flag.eq_ignore_ascii_case("y"));

        neos.push(NearEarthObject::new(designation, name, diameter, hazardous));
        stats.records_loaded += 1;
    }

    Ok((neos, stats))
}

/// Read close approach records from any JSON source
///
/// `source` is only used in error messages.
pub fn read_approaches<R: Read>(
    reader: R,
    source: &Path,
    options: LoadOptions,
) -> Result<(Vec<CloseApproach>, LoadStats), LoadError> {
    let document: CadDocument = serde_json::from_reader(reader).map_err(|e| {
        if e.is_data() {
            LoadError::InvalidStructure {
                path: source.to_path_buf(),
                message: e.to_string(),
            }
        } else {
            LoadError::Json {
                path: source.to_path_buf(),
                source: e,
            }
        }
    })?;

    let columns = match &document.fields {
        Some(fields) => {
            ApproachColumns::from_fields(fields).ok_or_else(|| LoadError::InvalidStructure {
                path: source.to_path_buf(),
                message: "'fields' must name des, cd, dist and v_rel".to_string(),
            })?
        }
        None => DEFAULT_APPROACH_COLUMNS,
    };

    let mut approaches = Vec::with_capacity(document.data.len());
    let mut stats = LoadStats::default();

    for (idx, row) in document.data.iter().enumerate() {
        let row_num = idx + 1;
        stats.rows_read += 1;

        let designation = cell(row, columns.designation);
        if designation.is_empty() {
            stats.skipped += 1;
            continue;
        }

        match parse_approach(row, &columns, designation) {
            Ok(approach) => {
                approaches.push(approach);
                stats.records_loaded += 1;
            }
            Err(message) => reject(&mut stats, source, row_num, message, options)?,
        }
    }

    Ok((approaches, stats))
}

/// Parse a calendar date like `2020-Jan-01 12:30` or `2020-Jan-01`
///
/// The month is a three-letter abbreviation; a missing time of day means 00:00.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%b-%d %H:%M")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%b-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_approach(
    row: &[JsonValue],
    columns: &ApproachColumns,
    designation: String,
) -> Result<CloseApproach, String> {
    let time_str = cell(row, columns.time);
    let time = parse_calendar_date(&time_str)
        .ok_or_else(|| format!("invalid calendar date '{}'", time_str))?;
    let distance = parse_non_negative(row, columns.distance, "distance")?;
    let velocity = parse_non_negative(row, columns.velocity, "velocity")?;
    Ok(CloseApproach::new(designation, time, distance, velocity))
}

fn parse_non_negative(row: &[JsonValue], idx: usize, what: &str) -> Result<f64, String> {
    let raw = cell(row, idx);
    match raw.parse::<f64>() {
        Ok(v) if v >= 0.0 => Ok(v),
        _ => Err(format!("invalid {} '{}'", what, raw)),
    }
}

/// Text content of a JSON cell; numbers are accepted as well as strings
fn cell(row: &[JsonValue], idx: usize) -> String {
    match row.get(idx) {
        Some(JsonValue::String(s)) => s.trim().to_string(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn reject(
    stats: &mut LoadStats,
    source: &Path,
    row: usize,
    message: String,
    options: LoadOptions,
) -> Result<(), LoadError> {
    if options.strict {
        return Err(LoadError::MalformedRow {
            path: source.to_path_buf(),
            row,
            message,
        });
    }
    stats.parse_errors += 1;
    warn!(path = %source.display(), row, "skipping malformed row: {}", message);
    Ok(())
}

fn open(path: &Path) -> Result<File, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Build a map from header name to column index
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase().trim().to_string(), i))
        .collect()
}

/// Get a non-empty field value from a CSV record
fn get_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const NEOS_CSV: &str = "\
id,spkid,full_name,pdes,name,prefix,neo,pha,diameter
a0000433,2000433,\"   433 Eros (A898 PA)\",433,Eros,,Y,N,16.84
a0002101,2002101,\"  2101 Adonis (1936 CA)\",2101,Adonis,,Y,Y,0.6
bK19S08C,3843383,\"       (2019 SC8)\",2019 SC8,,,Y,N,
,,,,,,,,
";

    const CAD_JSON: &str = r#"{
  "signature": {"version": "1.1", "source": "NASA/JPL SBDB Close Approach Data API"},
  "count": "3",
  "fields": ["des", "orbit_id", "jd", "cd", "dist", "dist_min", "dist_max", "v_rel", "v_inf", "t_sigma_f", "h"],
  "data": [
    ["433", "659", "2458849.5", "2020-Jan-01 00:00", "0.1", "0.09", "0.11", "5.0", "4.9", "< 00:01", "10.4"],
    ["2101", "45", "2458910.5", "2020-Mar-02 12:30", "0.03", "0.02", "0.04", "22.1", "22.0", "00:02", "18.7"],
    ["2019 SC8", "7", "2458900.5", "2020-Feb-20", 0.01, "0.01", "0.01", 10, "9.9", "00:10", "29.1"]
  ]
}"#;

    #[test]
    fn test_parse_calendar_date() {
        let with_time = parse_calendar_date("1900-Jan-01 00:11").unwrap();
        assert_eq!(with_time.format("%Y-%m-%d %H:%M").to_string(), "1900-01-01 00:11");

        let date_only = parse_calendar_date("2020-Dec-31").unwrap();
        assert_eq!(date_only.format("%Y-%m-%d %H:%M").to_string(), "2020-12-31 00:00");

        assert!(parse_calendar_date("2020-13-01 00:00").is_none());
        assert!(parse_calendar_date("").is_none());
    }

    #[test]
    fn test_read_neos() {
        let (neos, stats) =
            read_neos(NEOS_CSV.as_bytes(), Path::new("neos.csv"), LoadOptions::default()).unwrap();

        assert_eq!(neos.len(), 3);
        assert_eq!(stats.records_loaded, 3);
        assert_eq!(stats.skipped, 1);

        assert_eq!(neos[0].designation, "433");
        assert_eq!(neos[0].name.as_deref(), Some("Eros"));
        assert_eq!(neos[0].diameter, Some(16.84));
        assert!(!neos[0].hazardous);

        assert!(neos[1].hazardous);

        assert_eq!(neos[2].designation, "2019 SC8");
        assert_eq!(neos[2].name, None);
        assert_eq!(neos[2].diameter, None);
    }

    #[test]
    fn test_read_neos_requires_pdes_column() {
        let err = read_neos(
            "name,diameter\nEros,16.84\n".as_bytes(),
            Path::new("neos.csv"),
            LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidStructure { .. }));
    }

    #[test]
    fn test_read_approaches_by_field_names() {
        let (approaches, stats) =
            read_approaches(CAD_JSON.as_bytes(), Path::new("cad.json"), LoadOptions::default())
                .unwrap();

        assert_eq!(stats.records_loaded, 3);
        assert_eq!(approaches[0].designation, "433");
        assert_eq!(approaches[0].time_str(), "2020-01-01 00:00");
        assert_eq!(approaches[1].time_str(), "2020-03-02 12:30");
        assert_eq!(approaches[1].velocity, 22.1);
        // numeric cells and a date without time of day
        assert_eq!(approaches[2].time_str(), "2020-02-20 00:00");
        assert_eq!(approaches[2].distance, 0.01);
        assert_eq!(approaches[2].velocity, 10.0);
    }

    #[test]
    fn test_read_approaches_default_columns() {
        let json = r#"{"data": [["433", "x", "x", "2020-Jan-01 00:00", "0.1", "x", "x", "5.0"]]}"#;
        let (approaches, _) =
            read_approaches(json.as_bytes(), Path::new("cad.json"), LoadOptions::default())
                .unwrap();
        assert_eq!(approaches.len(), 1);
        assert_eq!(approaches[0].distance, 0.1);
    }

    #[test]
    fn test_malformed_row_lenient_and_strict() {
        let json = r#"{"data": [
            ["433", "x", "x", "2020-Jan-01 00:00", "0.1", "x", "x", "5.0"],
            ["433", "x", "x", "not a date", "0.1", "x", "x", "5.0"],
            ["433", "x", "x", "2020-Jan-02 00:00", "-1", "x", "x", "5.0"]
        ]}"#;

        let (approaches, stats) =
            read_approaches(json.as_bytes(), Path::new("cad.json"), LoadOptions::default())
                .unwrap();
        assert_eq!(approaches.len(), 1);
        assert_eq!(stats.parse_errors, 2);

        let err = read_approaches(
            json.as_bytes(),
            Path::new("cad.json"),
            LoadOptions { strict: true },
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::MalformedRow { row: 2, .. }));
    }

    #[test]
    fn test_missing_data_field() {
        let err = read_approaches(
            r#"{"count": "0"}"#.as_bytes(),
            Path::new("cad.json"),
            LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidStructure { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_neos(Path::new("/nonexistent/neos.csv"), LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_load_database_from_files() {
        let dir = tempdir().unwrap();
        let neo_path = dir.path().join("neos.csv");
        let cad_path = dir.path().join("cad.json");
        fs::write(&neo_path, NEOS_CSV).unwrap();
        fs::write(&cad_path, CAD_JSON).unwrap();

        let db = load_database(&neo_path, &cad_path, LoadOptions { strict: true }).unwrap();
        assert_eq!(db.statistics().total_neos, 3);
        assert_eq!(db.statistics().total_approaches, 3);
        assert_eq!(db.get_neo_by_name("adonis").unwrap().approach_count(), 1);
    }
}
