//! Money normalisation shared by the vendor mappers

/// Parse a vendor decimal string. Anything unparseable or non-finite is 0.0.
#[must_use]
pub fn parse_decimal(raw: &str) -> f64 {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Convert an integer amount in minor units (cents) to a decimal amount.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn from_minor_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// Discounts are stored as positive magnitudes whatever sign the vendor used.
#[must_use]
pub fn discount_magnitude(amount: f64) -> f64 {
    amount.abs()
}

/// Sum of amounts; empty input is 0.0.
pub fn sum<I: IntoIterator<Item = f64>>(amounts: I) -> f64 {
    amounts.into_iter().sum()
}
