/// Lenient numeric coercion for dirty tabular cells.
///
/// Thousands separators are stripped and whitespace trimmed before parsing.
/// Absent, blank, non-numeric and non-finite values all become `0.0`.
pub fn coerce_number(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}
