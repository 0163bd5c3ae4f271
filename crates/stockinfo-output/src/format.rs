//! Display formatting for optional numbers.
//!
//! Every formatter renders a missing or non-finite value as [`NOT_AVAILABLE`].

/// Placeholder for a missing value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Group digits with commas: `1234567` becomes `1,234,567`.
pub fn with_thousands(value: i128) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Price with two decimals: `$71.25`.
pub fn format_price(value: Option<f64>) -> String {
    finite(value).map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("${v:.2}"))
}

/// Whole dollars with separators: `$1,600,000,000`.
pub fn format_money(value: Option<f64>) -> String {
    finite(value).map_or_else(
        || NOT_AVAILABLE.to_string(),
        |v| {
            let rounded = with_thousands(v.round() as i128);
            rounded
                .strip_prefix('-')
                .map_or_else(|| format!("${rounded}"), |abs| format!("-${abs}"))
        },
    )
}

/// Integer count with separators: `123,456`.
pub fn format_count(value: Option<u64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| with_thousands(i128::from(v)))
}

/// Fraction as a percentage with two decimals: `0.006` becomes `0.60%`.
pub fn format_percent(value: Option<f64>) -> String {
    finite(value).map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:.2}%", v * 100.0))
}

/// Plain ratio with two decimals: `1.50`.
pub fn format_ratio(value: Option<f64>) -> String {
    finite(value).map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}"))
}
