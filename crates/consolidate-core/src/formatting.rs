/// Render a numeric cell the way a dataframe writes an integer-valued column:
/// integral values lose their fractional part, everything else keeps the
/// shortest round-trip representation.
///
/// # Examples
///
/// ```
/// use consolidate_core::formatting::format_cell_number;
///
/// assert_eq!(format_cell_number(100.0), "100");
/// assert_eq!(format_cell_number(-7.0), "-7");
/// assert_eq!(format_cell_number(12.5), "12.5");
/// ```
pub fn format_cell_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Render a float column value. Always carries a decimal point so that a
/// converted total of exactly one hundred dollars reads `100.0`.
///
/// # Examples
///
/// ```
/// use consolidate_core::formatting::format_float;
///
/// assert_eq!(format_float(100.0), "100.0");
/// assert_eq!(format_float(0.25), "0.25");
/// ```
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
