//! Fixed table of published metrics
//!
//! Each descriptor maps a stable metric key to a label, an optional unit,
//! and a pure extraction function over a [`Snapshot`]. The table holds no
//! mutable state and performs no I/O; it is safe to share across readers.
//! Metrics backed by the optional user record report
//! [`MetricValue::Unavailable`] (not zero) while no user data exists, so
//! consumers can tell "legitimately zero" from "cannot be computed".

use std::collections::HashSet;

use crate::snapshot::Snapshot;

/// One extracted metric value
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Counter or count value
    Unsigned(u64),

    /// Rate or difficulty value
    Float(f64),

    /// Identifier or timestamp text
    Text(String),

    /// The backing record (e.g. the primary user) is absent
    Unavailable,
}

/// Describes one published metric
pub struct MetricDescriptor {
    /// Stable metric key
    pub key: &'static str,

    /// Human-readable label
    pub label: &'static str,

    /// Unit of the extracted value, if any
    pub unit: Option<&'static str>,

    value_fn: fn(&Snapshot) -> MetricValue,
}

impl MetricDescriptor {
    /// Extract this metric's value from a snapshot
    pub fn value(&self, snapshot: &Snapshot) -> MetricValue {
        (self.value_fn)(snapshot)
    }
}

/// All published metrics, pool-wide first, then primary-user
pub static DESCRIPTORS: &[MetricDescriptor] = &[
    // Pool metrics (always computable from a built snapshot)
    MetricDescriptor {
        key: "pool_id",
        label: "Pool ID",
        unit: None,
        value_fn: |s| MetricValue::Text(s.pool.id.clone()),
    },
    MetricDescriptor {
        key: "pool_runtime",
        label: "Pool Runtime",
        unit: Some("s"),
        value_fn: |s| MetricValue::Unsigned(s.pool.runtime),
    },
    MetricDescriptor {
        key: "pool_timestamp",
        label: "Pool Last Update",
        unit: None,
        value_fn: |s| MetricValue::Text(s.pool.timestamp.clone()),
    },
    MetricDescriptor {
        key: "pool_users",
        label: "Connected Users",
        unit: None,
        value_fn: |s| MetricValue::Unsigned(s.pool.users),
    },
    MetricDescriptor {
        key: "pool_workers",
        label: "Connected Workers",
        unit: None,
        value_fn: |s| MetricValue::Unsigned(s.pool.workers),
    },
    MetricDescriptor {
        key: "pool_idle",
        label: "Idle Workers",
        unit: None,
        value_fn: |s| MetricValue::Unsigned(s.pool.idle),
    },
    MetricDescriptor {
        key: "pool_disconnected",
        label: "Disconnected Workers",
        unit: None,
        value_fn: |s| MetricValue::Unsigned(s.pool.disconnected),
    },
    MetricDescriptor {
        key: "pool_hashrate_1m",
        label: "Pool Hashrate (1m)",
        unit: Some("H/s"),
        value_fn: |s| MetricValue::Float(s.pool.hashrate_1m),
    },
    MetricDescriptor {
        key: "pool_hashrate_5m",
        label: "Pool Hashrate (5m)",
        unit: Some("H/s"),
        value_fn: |s| MetricValue::Float(s.pool.hashrate_5m),
    },
    MetricDescriptor {
        key: "pool_hashrate_15m",
        label: "Pool Hashrate (15m)",
        unit: Some("H/s"),
        value_fn: |s| MetricValue::Float(s.pool.hashrate_15m),
    },
    MetricDescriptor {
        key: "pool_hashrate_1h",
        label: "Pool Hashrate (1h)",
        unit: Some("H/s"),
        value_fn: |s| MetricValue::Float(s.pool.hashrate_1h),
    },
    MetricDescriptor {
        key: "pool_hashrate_6h",
        label: "Pool Hashrate (6h)",
        unit: Some("H/s"),
        value_fn: |s| MetricValue::Float(s.pool.hashrate_6h),
    },
    MetricDescriptor {
        key: "pool_hashrate_1d",
        label: "Pool Hashrate (24h)",
        unit: Some("H/s"),
        value_fn: |s| MetricValue::Float(s.pool.hashrate_1d),
    },
    MetricDescriptor {
        key: "pool_hashrate_7d",
        label: "Pool Hashrate (7d)",
        unit: Some("H/s"),
        value_fn: |s| MetricValue::Float(s.pool.hashrate_7d),
    },
    MetricDescriptor {
        key: "pool_difficulty",
        label: "Network Difficulty",
        unit: None,
        value_fn: |s| MetricValue::Float(s.pool.difficulty),
    },
    MetricDescriptor {
        key: "pool_best_share",
        label: "Best Share Difficulty",
        unit: None,
        value_fn: |s| MetricValue::Float(s.pool.best_share),
    },
    MetricDescriptor {
        key: "pool_shares_accepted",
        label: "Total Shares Accepted",
        unit: None,
        value_fn: |s| MetricValue::Unsigned(s.pool.accepted),
    },
    MetricDescriptor {
        key: "pool_shares_rejected",
        label: "Total Shares Rejected",
        unit: None,
        value_fn: |s| MetricValue::Unsigned(s.pool.rejected),
    },
    MetricDescriptor {
        key: "pool_sps_1m",
        label: "Shares Per Second (1m)",
        unit: Some("SPS"),
        value_fn: |s| MetricValue::Float(s.pool.sps_1m),
    },
    MetricDescriptor {
        key: "pool_sps_5m",
        label: "Shares Per Second (5m)",
        unit: Some("SPS"),
        value_fn: |s| MetricValue::Float(s.pool.sps_5m),
    },
    MetricDescriptor {
        key: "pool_sps_15m",
        label: "Shares Per Second (15m)",
        unit: Some("SPS"),
        value_fn: |s| MetricValue::Float(s.pool.sps_15m),
    },
    MetricDescriptor {
        key: "pool_sps_1h",
        label: "Shares Per Second (1h)",
        unit: Some("SPS"),
        value_fn: |s| MetricValue::Float(s.pool.sps_1h),
    },
    // Primary-user metrics (unavailable without a user record)
    MetricDescriptor {
        key: "user_address",
        label: "User Address",
        unit: None,
        value_fn: |s| match &s.user {
            Some(u) => MetricValue::Text(u.address.clone()),
            None => MetricValue::Unavailable,
        },
    },
    MetricDescriptor {
        key: "user_hashrate_1h",
        label: "User Hashrate (1h)",
        unit: Some("H/s"),
        value_fn: |s| match &s.user {
            Some(u) => MetricValue::Float(u.hashrate_1h),
            None => MetricValue::Unavailable,
        },
    },
    MetricDescriptor {
        key: "user_hashrate_1d",
        label: "User Hashrate (24h)",
        unit: Some("H/s"),
        value_fn: |s| match &s.user {
            Some(u) => MetricValue::Float(u.hashrate_1d),
            None => MetricValue::Unavailable,
        },
    },
    MetricDescriptor {
        key: "user_shares",
        label: "User Total Shares",
        unit: None,
        value_fn: |s| match &s.user {
            Some(u) => MetricValue::Unsigned(u.shares),
            None => MetricValue::Unavailable,
        },
    },
    MetricDescriptor {
        key: "user_best_share",
        label: "User Best Share Difficulty",
        unit: None,
        value_fn: |s| match &s.user {
            Some(u) => MetricValue::Float(u.best_ever),
            None => MetricValue::Unavailable,
        },
    },
    MetricDescriptor {
        key: "user_workers",
        label: "User Worker Count",
        unit: None,
        value_fn: |s| match &s.user {
            Some(u) => MetricValue::Unsigned(u.worker_count),
            None => MetricValue::Unavailable,
        },
    },
    MetricDescriptor {
        key: "user_last_share",
        label: "User Last Share Time",
        unit: None,
        value_fn: |s| match &s.user {
            Some(u) => match u.last_share {
                Some(ms) => MetricValue::Unsigned(ms),
                None => MetricValue::Text("Never".to_string()),
            },
            None => MetricValue::Unavailable,
        },
    },
];

/// The full descriptor table
pub fn descriptors() -> &'static [MetricDescriptor] {
    DESCRIPTORS
}

/// Look up one descriptor by metric key
pub fn find(key: &str) -> Option<&'static MetricDescriptor> {
    DESCRIPTORS.iter().find(|d| d.key == key)
}

/// Startup sanity check: keys unique, keys and labels non-empty
pub fn validate() -> std::result::Result<(), String> {
    let mut seen = HashSet::new();
    for descriptor in DESCRIPTORS {
        if descriptor.key.is_empty() {
            return Err("metric descriptor with empty key".to_string());
        }
        if descriptor.label.is_empty() {
            return Err(format!("metric '{}' has an empty label", descriptor.key));
        }
        if !seen.insert(descriptor.key) {
            return Err(format!("duplicate metric key: {}", descriptor.key));
        }
    }
    Ok(())
}
