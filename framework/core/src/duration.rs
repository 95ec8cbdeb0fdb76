use std::time::Duration;

use crate::error::ConfigError;

/// Parse a duration string of the form `<number><unit>` into a [Duration].
///
/// The number may be an integer or a decimal. The unit suffix is required, a bare number is
/// rejected so that a config author never has to guess whether `5` means seconds or
/// milliseconds. Recognised suffixes:
/// - `ms`, `milli`, `millis`, `millisecond`, `milliseconds`
/// - `s`, `sec`, `secs`, `second`, `seconds`
/// - `m`, `min`, `mins`, `minute`, `minutes`
/// - `h`, `hr`, `hrs`, `hour`, `hours`
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    let trimmed = value.trim();

    let unit_start = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .ok_or_else(|| invalid(value, "missing unit suffix"))?;
    let (number, unit) = trimmed.split_at(unit_start);

    let number: f64 = number
        .parse()
        .map_err(|_| invalid(value, "missing or malformed numeric value"))?;
    if number <= 0.0 {
        return Err(invalid(value, "duration must be positive"));
    }

    let millis_per_unit: f64 = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => 1_000.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
        other => return Err(invalid(value, &format!("unrecognised unit suffix `{other}`"))),
    };

    Ok(Duration::from_millis((number * millis_per_unit).round() as u64))
}

fn invalid(value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidDuration {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
