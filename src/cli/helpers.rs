//! Shared formatting helpers for CLI output

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Diameter for display columns, "-" when unknown
pub fn format_diameter(diameter: Option<f64>) -> String {
    match diameter {
        Some(d) => format!("{:.3}", d),
        None => "-".to_string(),
    }
}

/// Hazard flag for display columns, "-" when the object is unknown
pub fn format_hazardous(hazardous: Option<bool>) -> &'static str {
    match hazardous {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

/// Diameter for CSV cells: unknown diameters are written as "nan"
pub fn csv_diameter(diameter_km: f64) -> String {
    if diameter_km.is_nan() {
        "nan".to_string()
    } else {
        diameter_km.to_string()
    }
}
