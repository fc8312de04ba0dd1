//! Output writers for approaches and objects
//!
//! Every writer takes an `io::Write` so the same code serves stdout, files,
//! and in-memory buffers in tests.

use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{csv_diameter, format_diameter, format_hazardous, truncate_str};
use crate::cli::OutputFormat;
use crate::core::model::{Approach, ApproachRecord, NearEarthObject, NeoRecord};

/// Column order of approach CSV exports
pub const APPROACH_CSV_HEADER: [&str; 7] = [
    "datetime_utc",
    "distance_au",
    "velocity_km_s",
    "designation",
    "name",
    "diameter_km",
    "potentially_hazardous",
];

const NEO_CSV_HEADER: [&str; 4] = ["designation", "name", "diameter_km", "potentially_hazardous"];

const NAME_WIDTH: usize = 24;

/// Write approaches as CSV with a header row
pub fn write_csv<W: Write>(writer: W, approaches: &[Approach<'_>]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(APPROACH_CSV_HEADER).into_diagnostic()?;

    for approach in approaches {
        let ApproachRecord {
            datetime_utc,
            distance_au,
            velocity_km_s,
            neo,
        } = approach.to_record();
        wtr.write_record([
            datetime_utc,
            distance_au.to_string(),
            velocity_km_s.to_string(),
            neo.designation,
            neo.name,
            csv_diameter(neo.diameter_km),
            neo.potentially_hazardous.to_string(),
        ])
        .into_diagnostic()?;
    }

    wtr.flush().into_diagnostic()?;
    Ok(())
}

/// Write approaches as a pretty-printed JSON array
///
/// Unknown diameters serialize as `null`.
pub fn write_json<W: Write>(mut writer: W, approaches: &[Approach<'_>]) -> Result<()> {
    let records: Vec<ApproachRecord> = approaches.iter().map(Approach::to_record).collect();
    serde_json::to_writer_pretty(&mut writer, &records).into_diagnostic()?;
    writeln!(writer).into_diagnostic()?;
    Ok(())
}

/// Write one human-readable sentence per approach
pub fn write_text<W: Write>(mut writer: W, approaches: &[Approach<'_>]) -> Result<()> {
    for approach in approaches {
        writeln!(writer, "{}", approach).into_diagnostic()?;
    }
    Ok(())
}

/// Write approaches as an aligned table
pub fn write_table<W: Write>(mut writer: W, approaches: &[Approach<'_>]) -> Result<()> {
    let mut builder = Builder::default();
    builder.push_record([
        "Date (UTC)",
        "Designation",
        "Name",
        "Distance (au)",
        "Velocity (km/s)",
        "Diameter (km)",
        "Hazardous",
    ]);
    for approach in approaches {
        let name = approach
            .neo()
            .and_then(|neo| neo.name.as_deref())
            .unwrap_or("");
        builder.push_record([
            approach.record().time_str(),
            approach.designation().to_string(),
            truncate_str(name, NAME_WIDTH),
            format!("{:.4}", approach.distance()),
            format!("{:.2}", approach.velocity()),
            format_diameter(approach.diameter()),
            format_hazardous(approach.hazardous()).to_string(),
        ]);
    }
    writeln!(writer, "{}", builder.build().with(Style::rounded())).into_diagnostic()?;
    Ok(())
}

/// Write approaches in the requested format
pub fn write_approaches<W: Write>(
    writer: W,
    format: OutputFormat,
    approaches: &[Approach<'_>],
) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(writer, approaches),
        OutputFormat::Table => write_table(writer, approaches),
        OutputFormat::Csv => write_csv(writer, approaches),
        OutputFormat::Json => write_json(writer, approaches),
    }
}

/// Save approaches to `path`, choosing CSV or JSON by file extension
pub fn write_to_path(path: &Path, approaches: &[Approach<'_>]) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let format = match extension.as_deref() {
        Some("csv") => OutputFormat::Csv,
        Some("json") => OutputFormat::Json,
        _ => {
            return Err(miette::miette!(
                "Unsupported output file type '{}': use a .csv or .json file name",
                path.display()
            ))
        }
    };

    let file = File::create(path)
        .map_err(|e| miette::miette!("Cannot create {}: {}", path.display(), e))?;
    let mut out = BufWriter::new(file);
    write_approaches(&mut out, format, approaches)?;
    out.flush().into_diagnostic()
}

/// Write objects in the requested format
pub fn write_neos<W: Write>(
    mut writer: W,
    format: OutputFormat,
    neos: &[&NearEarthObject],
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for neo in neos {
                writeln!(writer, "{}", neo).into_diagnostic()?;
            }
        }
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record([
                "Designation",
                "Name",
                "Diameter (km)",
                "Hazardous",
                "Approaches",
            ]);
            for neo in neos {
                builder.push_record([
                    neo.designation.clone(),
                    truncate_str(neo.name.as_deref().unwrap_or(""), NAME_WIDTH),
                    format_diameter(neo.diameter),
                    format_hazardous(Some(neo.hazardous)).to_string(),
                    neo.approach_count().to_string(),
                ]);
            }
            writeln!(writer, "{}", builder.build().with(Style::rounded())).into_diagnostic()?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(writer);
            wtr.write_record(NEO_CSV_HEADER).into_diagnostic()?;
            for neo in neos {
                let NeoRecord {
                    designation,
                    name,
                    diameter_km,
                    potentially_hazardous,
                } = neo.to_record();
                wtr.write_record([
                    designation,
                    name,
                    csv_diameter(diameter_km),
                    potentially_hazardous.to_string(),
                ])
                .into_diagnostic()?;
            }
            wtr.flush().into_diagnostic()?;
        }
        OutputFormat::Json => {
            let records: Vec<NeoRecord> = neos.iter().map(|neo| neo.to_record()).collect();
            serde_json::to_writer_pretty(&mut writer, &records).into_diagnostic()?;
            writeln!(writer).into_diagnostic()?;
        }
    }
    Ok(())
}
