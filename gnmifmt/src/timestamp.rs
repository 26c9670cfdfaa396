//! RFC 3339 rendering of notification timestamps.

use chrono::{DateTime, Local, Offset, Utc};

use crate::config::TimeZoneMode;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Format Unix epoch nanoseconds as RFC 3339 with nanosecond precision.
///
/// Trailing zeros of the fractional second are dropped, and the fraction is
/// omitted entirely on whole seconds (`2023-11-14T22:13:20Z`). A zero UTC
/// offset is written as `Z`.
pub fn format_timestamp(nanos: i64, timezone: TimeZoneMode) -> String {
    let secs = nanos.div_euclid(NANOS_PER_SEC);
    let subsec = nanos.rem_euclid(NANOS_PER_SEC) as u32;

    let Some(utc) = DateTime::<Utc>::from_timestamp(secs, subsec) else {
        return nanos.to_string();
    };

    match timezone {
        TimeZoneMode::Utc => format!("{}{}Z", utc.format("%Y-%m-%dT%H:%M:%S"), fraction(subsec)),
        TimeZoneMode::Local => {
            let local = utc.with_timezone(&Local);
            let offset = if local.offset().fix().local_minus_utc() == 0 {
                "Z".to_string()
            } else {
                local.format("%:z").to_string()
            };
            format!(
                "{}{}{}",
                local.format("%Y-%m-%dT%H:%M:%S"),
                fraction(subsec),
                offset
            )
        }
    }
}

fn fraction(nanos: u32) -> String {
    if nanos == 0 {
        return String::new();
    }
    let digits = format!("{:09}", nanos);
    format!(".{}", digits.trim_end_matches('0'))
}
