//! UTC timestamp formatting for manifests.
//!
//! Uses `std::time::SystemTime` to avoid pulling in `chrono` for a single
//! `YYYY-MM-DDThh:mm:ssZ` string.

use std::time::{SystemTime, UNIX_EPOCH};

/// Return the current UTC time as `YYYY-MM-DDThh:mm:ssZ`.
///
/// # Errors
///
/// Returns an error if the system clock reads earlier than the Unix epoch.
pub fn now_utc_iso8601() -> Result<String, std::time::SystemTimeError> {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    Ok(format_epoch_secs(secs))
}

/// Format a Unix epoch timestamp as `YYYY-MM-DDThh:mm:ssZ`.
#[must_use]
pub fn format_epoch_secs(epoch_secs: u64) -> String {
    let (year, month, day) = civil_from_days(epoch_secs / 86_400);
    let day_secs = epoch_secs % 86_400;
    let hour = day_secs / 3_600;
    let minute = (day_secs % 3_600) / 60;
    let second = day_secs % 60;
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z")
}

/// Convert days since the epoch into a `(year, month, day)` triple.
///
/// Howard Hinnant's `civil_from_days`, restricted to non-negative day
/// counts so the arithmetic stays unsigned.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z % 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}
