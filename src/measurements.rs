use std::time::Duration;

/// Bits per second in one megabit per second.
pub const BITS_PER_MEGABIT: f64 = 1_000_000.0;

/// Calculate bandwidth in bits per second for a transfer.
///
/// Returns 0.0 when the elapsed time is zero, so an instantaneous
/// transfer never reports an infinite speed.
pub fn calculate_bandwidth_bps(bytes: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();

    if seconds <= 0.0 {
        return 0.0;
    }

    (bytes as f64 * 8.0) / seconds
}

/// Convert bits per second into megabits per second.
pub fn bps_to_mbps(bps: f64) -> f64 {
    bps / BITS_PER_MEGABIT
}
