use chrono::{DateTime, Utc};

// Display helpers for table cells; absent values render as an empty cell.

pub fn text_or_blank(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub fn number_or_blank(value: Option<f64>) -> String {
    match value {
        Some(v) => format_number(v),
        None => String::new(),
    }
}

/// Whole numbers print without a fraction, everything else with at most
/// two decimals.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
