//! Duration, tax, margin and rounding primitives

use chrono::NaiveTime;

use crate::error::BillingError;

/// Clock time format used on appointments
const CLOCK_FORMAT: &str = "%H:%M";

/// Parse an `HH:MM` 24-hour clock time
pub fn parse_clock_time(s: &str) -> Result<NaiveTime, BillingError> {
    NaiveTime::parse_from_str(s.trim(), CLOCK_FORMAT).map_err(|_| BillingError::InvalidClockTime(s.to_string()))
}

/// Hours between two `HH:MM` times on the same day
///
/// Zero or negative when `end` is not after `start`. None when either time
/// can't be parsed.
pub fn duration_hours(start: &str, end: &str) -> Option<f64> {
    let start = parse_clock_time(start).ok()?;
    let end = parse_clock_time(end).ok()?;
    Some((end - start).num_minutes() as f64 / 60.0)
}

/// Hours to bill for a session: unreadable times count as zero
pub fn billable_hours(start: &str, end: &str) -> f64 {
    duration_hours(start, end).unwrap_or(0.0)
}

/// Tax owed on an amount
pub fn tax(amount: f64, rate: f64) -> f64 {
    amount * rate
}

/// Amount plus its tax
pub fn total_with_tax(amount: f64, rate: f64) -> f64 {
    amount + tax(amount, rate)
}

/// Profit as a percentage of revenue (0 when there is no revenue)
pub fn margin_percent(revenue: f64, cost: f64) -> f64 {
    if revenue == 0.0 {
        return 0.0;
    }
    (revenue - cost) / revenue * 100.0
}

/// Round to cents, halves away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Replace NaN and infinities with 0
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
