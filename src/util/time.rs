//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const TICK_RATE_HZ: u32 = 60; // 60 ticks per second
pub const TICK_DURATION: Duration = Duration::from_micros(1_000_000 / TICK_RATE_HZ as u64);

/// Milliseconds elapsed between two timestamps, zero if the clock went backwards
pub fn elapsed_ms(since: u64, now: u64) -> u64 {
    now.saturating_sub(since)
}
