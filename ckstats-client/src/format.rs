//! Display helpers for presentation layers
//!
//! The registry reports raw numeric values; these helpers pick a readable
//! unit for rendering.

use chrono::DateTime;

/// Format a hashrate in H/s with a dynamic unit (TH/s down to H/s)
pub fn format_hashrate(rate_hs: f64) -> String {
    let rate = if rate_hs.is_finite() && rate_hs > 0.0 {
        rate_hs
    } else {
        0.0
    };

    if rate >= 1e12 {
        format!("{:.2} TH/s", rate / 1e12)
    } else if rate >= 1e9 {
        format!("{:.2} GH/s", rate / 1e9)
    } else if rate >= 1e6 {
        format!("{:.2} MH/s", rate / 1e6)
    } else if rate >= 1e3 {
        format!("{:.2} KH/s", rate / 1e3)
    } else {
        format!("{:.2} H/s", rate)
    }
}

/// Format a share difficulty with a dynamic suffix (T, G, M, K or raw)
pub fn format_difficulty(difficulty: f64) -> String {
    let diff = if difficulty.is_finite() && difficulty > 0.0 {
        difficulty
    } else {
        0.0
    };

    if diff >= 1e12 {
        format!("{:.2}T", diff / 1e12)
    } else if diff >= 1e9 {
        format!("{:.2}G", diff / 1e9)
    } else if diff >= 1e6 {
        format!("{:.2}M", diff / 1e6)
    } else if diff >= 1e3 {
        format!("{:.2}K", diff / 1e3)
    } else {
        format!("{:.2}", diff)
    }
}

/// Format an epoch-millisecond timestamp as `YYYY-MM-DD HH:MM:SS` UTC
///
/// `None` and zero both render as "Never", matching how the upstream API
/// reports users that have not submitted a share yet.
pub fn format_timestamp_ms(timestamp_ms: Option<u64>) -> String {
    let ms = match timestamp_ms {
        None | Some(0) => return "Never".to_string(),
        Some(ms) => ms,
    };

    match DateTime::from_timestamp((ms / 1000) as i64, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Unknown".to_string(),
    }
}
