use embassy_time::Duration;

/// Maximum silence while waiting for the next byte of a command response
pub const fn response_timeout() -> Duration {
    Duration::from_millis(20_000)
}

/// Quiet time after which pending incoming bytes are considered flushed
pub const fn flush_quiet_time() -> Duration {
    Duration::from_millis(100)
}

/// Time the module needs between a bulk data header and its payload
pub const fn bulk_settle_time() -> Duration {
    Duration::from_millis(100)
}

/// Guard time after the `+++` escape before the module accepts commands
pub const fn escape_guard_time() -> Duration {
    Duration::from_secs(1)
}
