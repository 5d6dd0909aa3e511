use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};

const CLF_MONTH: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Common log format: `02/Jan/2024:03:04:05 +0000`.
pub(crate) fn clf(now: &DateTime<Utc>) -> String {
    format!(
        "{:02}/{}/{}:{:02}:{:02}:{:02} +0000",
        now.day(),
        CLF_MONTH[now.month0() as usize],
        now.year(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// ISO-8601 with milliseconds: `2024-01-02T03:04:05.678Z`.
pub(crate) fn iso(now: &DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// RFC 1123: `Tue, 02 Jan 2024 03:04:05 GMT`.
pub(crate) fn web(now: &DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
