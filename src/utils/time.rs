use chrono::{DateTime, Utc};

/// Milliseconds elapsed between two instants, never negative.
pub fn elapsed_millis(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}
