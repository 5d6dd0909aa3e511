use std::time::Duration;

use metrics::{counter, histogram};

pub const LINES_TOTAL: &str = "access_log_lines_total";
pub const SKIPPED_TOTAL: &str = "access_log_skipped_total";
pub const RENDER_ERRORS_TOTAL: &str = "access_log_render_errors_total";
pub const RESPONSE_TIME_SECONDS: &str = "access_log_response_time_seconds";

/// `2xx`, `4xx`, ... label for a status code.
pub fn status_class(status_code: u16) -> String {
    format!("{}xx", status_code / 100)
}

pub fn record_line_written(status_code: u16, elapsed: Duration) {
    let class = status_class(status_code);

    counter!(LINES_TOTAL, "status_class" => class.clone()).increment(1);
    histogram!(RESPONSE_TIME_SECONDS, "status_class" => class).record(elapsed.as_secs_f64());
}

pub fn record_skipped() {
    counter!(SKIPPED_TOTAL).increment(1);
}

pub fn record_render_failure() {
    counter!(RENDER_ERRORS_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_class_labels() {
        assert_eq!(status_class(101), "1xx");
        assert_eq!(status_class(200), "2xx");
        assert_eq!(status_class(404), "4xx");
        assert_eq!(status_class(503), "5xx");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_line_written(200, Duration::from_millis(5));
        record_skipped();
        record_render_failure();
    }
}
