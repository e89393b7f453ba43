use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fetch::{StatsApi, POOL_CURRENT_ENDPOINT, USERS_ENDPOINT};

/// Pool-wide statistics from `/api/pool/current`
///
/// Every numeric field defaults to zero when the payload omits it or carries
/// a value of the wrong type; extraction never fails on a well-formed JSON
/// object. Hashrates are H/s and may arrive as JSON numbers or numeric
/// strings (ckstats emits both across versions).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Pool identifier
    pub id: String,

    /// Pool runtime in seconds
    pub runtime: u64,

    /// Last-update timestamp as reported by the API
    pub timestamp: String,

    /// Connected user count
    pub users: u64,

    /// Connected worker count
    pub workers: u64,

    /// Idle worker count
    pub idle: u64,

    /// Disconnected worker count
    pub disconnected: u64,

    /// Hashrate over rolling windows, H/s
    pub hashrate_1m: f64,
    pub hashrate_5m: f64,
    pub hashrate_15m: f64,
    pub hashrate_1h: f64,
    pub hashrate_6h: f64,
    pub hashrate_1d: f64,
    pub hashrate_7d: f64,

    /// Network difficulty
    pub difficulty: f64,

    /// Best share difficulty seen by the pool
    pub best_share: f64,

    /// Cumulative accepted share count
    pub accepted: u64,

    /// Cumulative rejected share count
    pub rejected: u64,

    /// Shares per second over rolling windows
    pub sps_1m: f64,
    pub sps_5m: f64,
    pub sps_15m: f64,
    pub sps_1h: f64,
}

impl PoolSnapshot {
    /// Extract pool statistics from the raw API payload
    pub fn from_value(value: &Value) -> Self {
        Self {
            id: string_field(value, &["id"]),
            runtime: uint_field(value, &["runtime"]),
            timestamp: string_field(value, &["timestamp"]),
            users: uint_field(value, &["users"]),
            workers: uint_field(value, &["workers"]),
            idle: uint_field(value, &["idle"]),
            disconnected: uint_field(value, &["disconnected"]),
            hashrate_1m: float_field(value, &["hashrate1m"]),
            hashrate_5m: float_field(value, &["hashrate5m"]),
            hashrate_15m: float_field(value, &["hashrate15m"]),
            // ckstats emitted both spellings across versions
            hashrate_1h: float_field(value, &["hashrate1hr", "hashrate1h"]),
            hashrate_6h: float_field(value, &["hashrate6hr", "hashrate6h"]),
            hashrate_1d: float_field(value, &["hashrate1d"]),
            hashrate_7d: float_field(value, &["hashrate7d"]),
            difficulty: float_field(value, &["diff"]),
            best_share: float_field(value, &["bestshare"]),
            accepted: uint_field(value, &["accepted"]),
            rejected: uint_field(value, &["rejected"]),
            sps_1m: float_field(value, &["SPS1m"]),
            sps_5m: float_field(value, &["SPS5m"]),
            sps_15m: float_field(value, &["SPS15m"]),
            sps_1h: float_field(value, &["SPS1h"]),
        }
    }
}

/// Primary-user statistics from the first entry of `/api/users`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    /// Payout address of the user
    pub address: String,

    /// Hashrate over rolling windows, H/s
    pub hashrate_1h: f64,
    pub hashrate_1d: f64,

    /// Cumulative share count
    pub shares: u64,

    /// Best share difficulty ever submitted by this user
    pub best_ever: f64,

    /// Active worker count
    pub worker_count: u64,

    /// Last share timestamp in epoch milliseconds; `None` means no share yet
    pub last_share: Option<u64>,
}

impl UserSnapshot {
    /// Extract user statistics from one entry of the user list
    pub fn from_value(value: &Value) -> Self {
        let last_share = match uint_field(value, &["lastShare"]) {
            0 => None,
            ms => Some(ms),
        };

        Self {
            address: string_field(value, &["userAddress", "address"]),
            hashrate_1h: float_field(value, &["hashrate1hr", "hashrate1h"]),
            hashrate_1d: float_field(value, &["hashrate1d"]),
            shares: uint_field(value, &["shares"]),
            best_ever: float_field(value, &["bestEver"]),
            worker_count: uint_field(value, &["workerCount", "workercount"]),
            last_share,
        }
    }
}

/// Immutable merged result of one refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Pool-wide statistics (mandatory)
    pub pool: PoolSnapshot,

    /// Primary-user statistics, absent when the user list is empty or the
    /// user fetch failed
    pub user: Option<UserSnapshot>,

    /// When this snapshot was built
    pub fetched_at: DateTime<Utc>,

    /// Whether the pool-stats fetch succeeded (always true for a built
    /// snapshot; the builder fails outright otherwise)
    pub pool_ok: bool,

    /// Whether the user-list fetch succeeded
    pub user_ok: bool,
}

/// Builds one snapshot per refresh cycle from the two stats endpoints
///
/// The two fetches run concurrently. Pool statistics are mandatory: if that
/// fetch fails the whole build fails. User statistics are best-effort: a
/// failed fetch or an empty list just omits the user record.
pub struct SnapshotBuilder {
    api: Arc<dyn StatsApi>,
}

impl SnapshotBuilder {
    /// Create a builder over the given transport
    pub fn new(api: Arc<dyn StatsApi>) -> Self {
        Self { api }
    }

    /// Fetch both endpoints and merge the results into one snapshot
    pub async fn build(&self) -> Result<Snapshot> {
        let (pool_result, users_result) = tokio::join!(
            self.api.get_json(POOL_CURRENT_ENDPOINT),
            self.api.get_json(USERS_ENDPOINT),
        );

        // Pool statistics are mandatory
        let pool_value = pool_result?;
        let pool = PoolSnapshot::from_value(&pool_value);

        let (user, user_ok) = match users_result {
            Ok(Value::Array(entries)) => {
                let user = entries.first().map(UserSnapshot::from_value);
                if user.is_none() {
                    debug!("user list is empty, omitting user snapshot");
                }
                (user, true)
            }
            Ok(other) => {
                warn!("user list endpoint returned non-array payload: {}", other);
                (None, false)
            }
            Err(e) => {
                warn!("user list fetch failed, continuing without user data: {}", e);
                (None, false)
            }
        };

        Ok(Snapshot {
            pool,
            user,
            fetched_at: Utc::now(),
            pool_ok: true,
            user_ok,
        })
    }
}

/// First present key wins; absent or non-string values map to empty
fn string_field(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| value.get(k))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// First present key wins; absent or wrong-typed values map to zero
fn uint_field(value: &Value, keys: &[&str]) -> u64 {
    keys.iter()
        .find_map(|k| value.get(k))
        .map(json_to_u64)
        .unwrap_or(0)
}

/// First present key wins; absent or wrong-typed values map to zero
fn float_field(value: &Value, keys: &[&str]) -> f64 {
    keys.iter()
        .find_map(|k| value.get(k))
        .map(json_to_f64)
        .unwrap_or(0.0)
}

fn json_to_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| if f > 0.0 { f as u64 } else { 0 }))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn json_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoolStatsError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct StubApi {
        pool: Value,
        users: Value,
        fail_pool: bool,
        fail_users: bool,
    }

    impl StubApi {
        fn new(pool: Value, users: Value) -> Self {
            Self {
                pool,
                users,
                fail_pool: false,
                fail_users: false,
            }
        }
    }

    #[async_trait]
    impl StatsApi for StubApi {
        async fn get_json(&self, path: &str) -> Result<Value> {
            match path {
                POOL_CURRENT_ENDPOINT if self.fail_pool => Err(PoolStatsError::Timeout),
                POOL_CURRENT_ENDPOINT => Ok(self.pool.clone()),
                USERS_ENDPOINT if self.fail_users => {
                    Err(PoolStatsError::Unreachable("connection refused".to_string()))
                }
                USERS_ENDPOINT => Ok(self.users.clone()),
                other => panic!("unexpected path: {}", other),
            }
        }
    }

    #[test]
    fn test_pool_snapshot_full_payload() {
        let payload = json!({
            "id": "solo-ck",
            "runtime": 86400,
            "timestamp": "2024-01-01 00:00:00",
            "users": 5,
            "workers": 12,
            "idle": 1,
            "disconnected": 2,
            "hashrate1m": 1.5e12,
            "hashrate5m": 1.4e12,
            "hashrate15m": 1.3e12,
            "hashrate1hr": 1.2e12,
            "hashrate6hr": 1.1e12,
            "hashrate1d": 1.0e12,
            "hashrate7d": 0.9e12,
            "diff": 72000000000000.0,
            "bestshare": 123456789.0,
            "accepted": 1000000,
            "rejected": 42,
            "SPS1m": 2.5,
            "SPS5m": 2.4,
            "SPS15m": 2.3,
            "SPS1h": 2.2
        });

        let pool = PoolSnapshot::from_value(&payload);
        assert_eq!(pool.id, "solo-ck");
        assert_eq!(pool.runtime, 86400);
        assert_eq!(pool.users, 5);
        assert_eq!(pool.workers, 12);
        assert_eq!(pool.idle, 1);
        assert_eq!(pool.disconnected, 2);
        assert_eq!(pool.hashrate_1m, 1.5e12);
        assert_eq!(pool.hashrate_1h, 1.2e12);
        assert_eq!(pool.hashrate_7d, 0.9e12);
        assert_eq!(pool.difficulty, 72000000000000.0);
        assert_eq!(pool.best_share, 123456789.0);
        assert_eq!(pool.accepted, 1000000);
        assert_eq!(pool.rejected, 42);
        assert_eq!(pool.sps_1h, 2.2);
    }

    #[test]
    fn test_pool_snapshot_absent_fields_default_to_zero() {
        let pool = PoolSnapshot::from_value(&json!({}));
        assert_eq!(pool, PoolSnapshot::default());
    }

    #[test]
    fn test_pool_snapshot_wrong_typed_fields_default_to_zero() {
        let payload = json!({
            "runtime": "not a number",
            "hashrate1m": {"nested": true},
            "accepted": null
        });

        let pool = PoolSnapshot::from_value(&payload);
        assert_eq!(pool.runtime, 0);
        assert_eq!(pool.hashrate_1m, 0.0);
        assert_eq!(pool.accepted, 0);
    }

    #[test]
    fn test_numeric_strings_parse() {
        let payload = json!({"hashrate1h": "123000000000", "runtime": "3600"});
        let pool = PoolSnapshot::from_value(&payload);
        assert_eq!(pool.hashrate_1h, 123000000000.0);
        assert_eq!(pool.runtime, 3600);
    }

    #[test]
    fn test_user_snapshot_extraction() {
        let payload = json!({
            "userAddress": "bc1qexample",
            "hashrate1hr": "500000",
            "hashrate1d": 450000.0,
            "shares": 9001,
            "bestEver": 777.0,
            "workerCount": 2,
            "lastShare": 1700000000000u64
        });

        let user = UserSnapshot::from_value(&payload);
        assert_eq!(user.address, "bc1qexample");
        assert_eq!(user.hashrate_1h, 500000.0);
        assert_eq!(user.hashrate_1d, 450000.0);
        assert_eq!(user.shares, 9001);
        assert_eq!(user.best_ever, 777.0);
        assert_eq!(user.worker_count, 2);
        assert_eq!(user.last_share, Some(1700000000000));
    }

    #[test]
    fn test_user_snapshot_zero_last_share_is_none() {
        let user = UserSnapshot::from_value(&json!({"lastShare": 0}));
        assert_eq!(user.last_share, None);
    }

    #[test]
    fn test_user_snapshot_alternate_keys() {
        // Some API versions use lowercase keys and "address"
        let payload = json!({
            "address": "bc1qother",
            "hashrate1h": 250000.0,
            "workercount": 3
        });

        let user = UserSnapshot::from_value(&payload);
        assert_eq!(user.address, "bc1qother");
        assert_eq!(user.hashrate_1h, 250000.0);
        assert_eq!(user.worker_count, 3);
    }

    #[tokio::test]
    async fn test_build_merges_pool_and_primary_user() {
        let api = StubApi::new(
            json!({"hashrate1h": "123000000000", "users": 5}),
            json!([
                {"address": "bc1qprimary", "hashrate1hr": "500000", "workercount": 2},
                {"address": "bc1qsecond", "hashrate1hr": "100000", "workercount": 1}
            ]),
        );

        let builder = SnapshotBuilder::new(Arc::new(api));
        let snapshot = builder.build().await.unwrap();

        assert_eq!(snapshot.pool.hashrate_1h, 123000000000.0);
        assert_eq!(snapshot.pool.users, 5);
        assert!(snapshot.pool_ok);
        assert!(snapshot.user_ok);

        let user = snapshot.user.unwrap();
        assert_eq!(user.address, "bc1qprimary");
        assert_eq!(user.worker_count, 2);
    }

    #[tokio::test]
    async fn test_build_with_empty_user_list_still_succeeds() {
        let api = StubApi::new(json!({"users": 0}), json!([]));

        let builder = SnapshotBuilder::new(Arc::new(api));
        let snapshot = builder.build().await.unwrap();

        assert!(snapshot.user.is_none());
        assert!(snapshot.user_ok);
    }

    #[tokio::test]
    async fn test_build_with_failed_user_fetch_still_succeeds() {
        let mut api = StubApi::new(json!({"users": 2}), json!([]));
        api.fail_users = true;

        let builder = SnapshotBuilder::new(Arc::new(api));
        let snapshot = builder.build().await.unwrap();

        assert!(snapshot.user.is_none());
        assert!(!snapshot.user_ok);
        assert!(snapshot.pool_ok);
    }

    #[tokio::test]
    async fn test_build_with_non_array_user_payload() {
        let api = StubApi::new(json!({"users": 2}), json!({"error": "oops"}));

        let builder = SnapshotBuilder::new(Arc::new(api));
        let snapshot = builder.build().await.unwrap();

        assert!(snapshot.user.is_none());
        assert!(!snapshot.user_ok);
    }

    #[tokio::test]
    async fn test_build_fails_when_pool_fetch_fails() {
        let mut api = StubApi::new(json!({}), json!([]));
        api.fail_pool = true;

        let builder = SnapshotBuilder::new(Arc::new(api));
        let err = builder.build().await.unwrap_err();

        assert!(matches!(err, PoolStatsError::Timeout));
    }
}
