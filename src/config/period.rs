//! Posting period parsing.
//!
//! Periods are written as a sequence of decimal numbers with unit
//! suffixes, e.g. `90m`, `1h30m` or `1.5h`.

use std::time::Duration;

use super::ConfigError;

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3600 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(nanos)
}

/// Converts one `<number><unit>` term to nanoseconds.
fn term_nanos(number: &str, unit_nanos: u128) -> Option<u128> {
    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(unit_nanos)?;

    if !frac.is_empty() {
        let digits: u128 = frac.parse().ok()?;
        let scale = 10_u128.checked_pow(u32::try_from(frac.len()).ok()?)?;
        nanos = nanos.checked_add(digits.checked_mul(unit_nanos)? / scale)?;
    }

    Some(nanos)
}

/// Parses a posting period.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPeriod`] for malformed, zero, or
/// out-of-range periods.
pub fn parse_period(input: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &'static str| ConfigError::InvalidPeriod {
        value: input.to_owned(),
        reason,
    };

    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid("empty duration"));
    }

    let mut total_nanos: u128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_end);
        if number.is_empty() {
            return Err(invalid("expected a number"));
        }

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        if unit.is_empty() {
            return Err(invalid("missing unit"));
        }
        let unit = unit_nanos(unit).ok_or_else(|| invalid("unknown unit"))?;

        let nanos = term_nanos(number, unit).ok_or_else(|| invalid("expected a number"))?;
        total_nanos = total_nanos
            .checked_add(nanos)
            .ok_or_else(|| invalid("out of range"))?;
        rest = tail;
    }

    if total_nanos == 0 {
        return Err(invalid("must be positive"));
    }

    let secs = u64::try_from(total_nanos / NANOS_PER_SEC).map_err(|_| invalid("out of range"))?;
    let subsec = u32::try_from(total_nanos % NANOS_PER_SEC).map_err(|_| invalid("out of range"))?;
    Ok(Duration::new(secs, subsec))
}
