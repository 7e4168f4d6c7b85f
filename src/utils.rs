use chrono::{DateTime, SecondsFormat, Utc};

// ###################################
// ->   Time utils
// ###################################
/// RFC 3339 in UTC with millisecond precision and a `Z` suffix, e.g. `2024-05-01T09:30:00.000Z`.
pub fn iso_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
