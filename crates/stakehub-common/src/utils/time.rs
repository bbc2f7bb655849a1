use std::time::Duration;

/// Time elapsed between two block timestamps, zero if `to` precedes `from`.
pub fn duration_since(from: i64, to: i64) -> Duration {
    Duration::from_secs(to.saturating_sub(from).max(0) as u64)
}

pub fn format_timestamp(timestamp: i64) -> String {
    let datetime = chrono::DateTime::<chrono::Utc>::from_timestamp(timestamp, 0)
        .unwrap_or_default();
    datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
