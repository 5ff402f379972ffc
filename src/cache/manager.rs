//! Cache manager deciding between stored responses and fresh fetches
//!
//! Each entry occupies two store keys: `<key>` holds the JSON payload and
//! `<key>-expiry` holds the expiry instant in epoch milliseconds. An entry is
//! served only while the clock is strictly before its expiry. Expired or
//! unreadable entries are treated as absent and overwritten by the next
//! `put`; the only deletions happen when the store exceeds its entry bound.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{CacheError, Clock, KeyValueStore};
use crate::data::QueryKey;

/// Suffix of the store key holding an entry's expiry stamp
const EXPIRY_SUFFIX: &str = "-expiry";

/// Default bound on the number of entries per domain (one year of days)
pub const DEFAULT_MAX_ENTRIES: usize = 366;

/// How long an entry stays fresh, depending on the day it describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// TTL for data about the current calendar day, which is still accumulating
    pub today_ttl: Duration,
    /// TTL for data about any other day
    pub past_ttl: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            today_ttl: Duration::minutes(10),
            past_ttl: Duration::hours(24),
        }
    }
}

impl ExpiryPolicy {
    /// Returns the TTL for an entry about `reference_date` written at `now`
    pub fn ttl(&self, reference_date: NaiveDate, now: DateTime<Local>) -> Duration {
        if reference_date == now.date_naive() {
            self.today_ttl
        } else {
            self.past_ttl
        }
    }
}

/// A fresh entry read from the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// Store key the payload was read from
    pub key: String,
    /// The cached payload
    pub payload: T,
    /// When the entry stops being served
    pub expires_at: DateTime<Local>,
}

/// Reads and writes expiring entries in a [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct CacheManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    policy: ExpiryPolicy,
    /// Maximum entries kept per key domain; `None` means unbounded
    max_entries: Option<usize>,
}

impl CacheManager {
    /// Creates a manager with the default expiry policy and entry bound
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            policy: ExpiryPolicy::default(),
            max_entries: Some(DEFAULT_MAX_ENTRIES),
        }
    }

    /// Replaces the expiry policy
    pub fn with_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the entry bound; `None` or `Some(0)` disables eviction
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries.filter(|max| *max > 0);
        self
    }

    /// Returns the TTL an entry about `reference_date` gets when written at `now`
    pub fn ttl(&self, reference_date: NaiveDate, now: DateTime<Local>) -> Duration {
        self.policy.ttl(reference_date, now)
    }

    /// Reads a fresh entry
    ///
    /// Returns `None` if the entry is missing, expired, or cannot be parsed
    /// back into `T`. Nothing is removed from the store.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<CacheEntry<T>> {
        let name = key.to_string();

        let expires_at = self.read_expiry(&name)?;
        if self.clock.now() >= expires_at {
            debug!(key = %name, %expires_at, "cache entry expired");
            return None;
        }

        let raw = self.store.get(&name)?;
        let payload = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(key = %name, error = %e, "ignoring unreadable cache payload");
                return None;
            }
        };

        debug!(key = %name, %expires_at, "cache hit");
        Some(CacheEntry {
            key: name,
            payload,
            expires_at,
        })
    }

    /// Stores `payload` under `key`, replacing any previous entry
    ///
    /// The expiry is computed from the key's date and the current time. If
    /// the key's domain then holds more entries than the bound allows, the
    /// entries closest to expiry are evicted. A failed eviction is logged and
    /// does not fail the write.
    pub fn put<T: Serialize>(&self, key: &QueryKey, payload: &T) -> Result<(), CacheError> {
        let now = self.clock.now();
        let expires_at = now + self.ttl(key.date(), now);
        let name = key.to_string();

        let json = serde_json::to_string(payload)?;
        self.store.set(&name, &json)?;
        self.store
            .set(&expiry_key(&name), &expires_at.timestamp_millis().to_string())?;
        debug!(key = %name, %expires_at, "cache entry written");

        if let Some(max) = self.max_entries {
            if let Err(e) = self.evict_over_bound(key.domain(), &name, max) {
                warn!(key = %name, error = %e, "cache eviction failed");
            }
        }
        Ok(())
    }

    /// Parses the expiry stamp stored for `name`
    fn read_expiry(&self, name: &str) -> Option<DateTime<Local>> {
        let raw = self.store.get(&expiry_key(name))?;
        let parsed = raw
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        if parsed.is_none() {
            debug!(key = %name, raw = %raw, "ignoring unreadable cache expiry");
        }
        parsed.map(|at| at.with_timezone(&Local))
    }

    /// Removes the entries of `domain` closest to expiry until at most `max` remain
    fn evict_over_bound(&self, domain: &str, keep: &str, max: usize) -> Result<(), CacheError> {
        let prefix = format!("{}-", domain);
        let mut entries: Vec<(Option<DateTime<Local>>, String)> = self
            .store
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(&prefix) && !k.ends_with(EXPIRY_SUFFIX))
            .map(|k| (self.read_expiry(&k), k))
            .collect();

        if entries.len() <= max {
            return Ok(());
        }

        // Unreadable expiries sort first
        entries.sort();
        let excess = entries.len() - max;
        for (_, name) in entries.into_iter().filter(|(_, k)| k != keep).take(excess) {
            self.store.remove(&name)?;
            self.store.remove(&expiry_key(&name))?;
            debug!(key = %name, "evicted cache entry");
        }
        Ok(())
    }
}

fn expiry_key(name: &str) -> String {
    format!("{}{}", name, EXPIRY_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, MemoryStore};
    use chrono::TimeZone;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn sample() -> TestData {
        TestData {
            name: "sample".to_string(),
            value: 42,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .expect("unambiguous local time")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Store whose removals always fail
    #[derive(Debug, Default)]
    struct NoRemoveStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for NoRemoveStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
            self.inner.set(key, value)
        }

        fn remove(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only store",
            )))
        }

        fn keys(&self) -> Vec<String> {
            self.inner.keys()
        }
    }

    fn create_test_cache(now: DateTime<Local>) -> (CacheManager, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(now));
        let cache = CacheManager::new(store.clone(), clock.clone());
        (cache, store, clock)
    }

    #[test]
    fn test_ttl_is_short_throughout_the_same_day() {
        let (cache, _, _) = create_test_cache(at(2024, 5, 1, 0, 0));
        let day = date(2024, 5, 1);

        let early = cache.ttl(day, at(2024, 5, 1, 0, 5));
        let late = cache.ttl(day, at(2024, 5, 1, 23, 50));

        assert_eq!(early, late);
        assert_eq!(early, Duration::minutes(10));
    }

    #[test]
    fn test_ttl_is_long_for_past_days() {
        let (cache, _, _) = create_test_cache(at(2024, 5, 1, 0, 0));

        assert_eq!(cache.ttl(date(2024, 4, 30), at(2024, 5, 1, 0, 1)), Duration::hours(24));
        assert_eq!(cache.ttl(date(2022, 1, 1), at(2024, 5, 1, 18, 0)), Duration::hours(24));
        assert_eq!(cache.ttl(date(2024, 4, 30), at(2030, 1, 1, 12, 0)), Duration::hours(24));
    }

    #[test]
    fn test_custom_policy_is_used() {
        let (cache, _, _) = create_test_cache(at(2024, 5, 1, 12, 0));
        let cache = cache.with_policy(ExpiryPolicy {
            today_ttl: Duration::minutes(1),
            past_ttl: Duration::days(7),
        });

        assert_eq!(cache.ttl(date(2024, 5, 1), at(2024, 5, 1, 12, 0)), Duration::minutes(1));
        assert_eq!(cache.ttl(date(2024, 4, 1), at(2024, 5, 1, 12, 0)), Duration::days(7));
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (cache, _, _) = create_test_cache(at(2024, 5, 1, 12, 0));
        let key = QueryKey::daily_consumption(date(2024, 5, 1));

        assert!(cache.get::<TestData>(&key).is_none());
    }

    #[test]
    fn test_put_then_get_at_same_instant_returns_payload() {
        let (cache, _, _) = create_test_cache(at(2024, 5, 1, 12, 0));
        let key = QueryKey::daily_consumption(date(2024, 5, 1));

        cache.put(&key, &sample()).expect("put should succeed");
        let entry = cache.get::<TestData>(&key).expect("entry should be fresh");

        assert_eq!(entry.payload, sample());
        assert_eq!(entry.key, "daily-consumption-2024-05-01");
        assert_eq!(entry.expires_at, at(2024, 5, 1, 12, 10));
    }

    #[test]
    fn test_today_entry_expires_after_short_ttl() {
        let (cache, _, clock) = create_test_cache(at(2024, 5, 1, 12, 0));
        let key = QueryKey::daily_consumption(date(2024, 5, 1));
        cache.put(&key, &sample()).unwrap();

        clock.advance(Duration::minutes(10) - Duration::milliseconds(1));
        assert!(cache.get::<TestData>(&key).is_some());

        clock.advance(Duration::milliseconds(2));
        assert!(cache.get::<TestData>(&key).is_none());
    }

    #[test]
    fn test_entry_is_expired_exactly_at_expiry() {
        let (cache, _, clock) = create_test_cache(at(2024, 5, 1, 12, 0));
        let key = QueryKey::daily_consumption(date(2024, 5, 1));
        cache.put(&key, &sample()).unwrap();

        clock.advance(Duration::minutes(10));

        assert!(cache.get::<TestData>(&key).is_none());
    }

    #[test]
    fn test_past_day_written_far_in_future_gets_long_ttl() {
        let written = at(2030, 6, 15, 9, 0);
        let (cache, store, clock) = create_test_cache(written);
        let key = QueryKey::daily_consumption(date(2024, 1, 1));

        cache.put(&key, &sample()).unwrap();
        assert_eq!(
            store.get("daily-consumption-2024-01-01-expiry"),
            Some((written + Duration::hours(24)).timestamp_millis().to_string())
        );

        clock.advance(Duration::hours(23) + Duration::minutes(59));
        assert_eq!(cache.get::<TestData>(&key).map(|e| e.payload), Some(sample()));

        clock.set(written + Duration::hours(24) + Duration::milliseconds(1));
        assert!(cache.get::<TestData>(&key).is_none());
    }

    #[test]
    fn test_expired_entry_is_not_removed() {
        let (cache, store, clock) = create_test_cache(at(2024, 5, 1, 12, 0));
        let key = QueryKey::daily_consumption(date(2024, 5, 1));
        cache.put(&key, &sample()).unwrap();

        clock.advance(Duration::hours(1));
        assert!(cache.get::<TestData>(&key).is_none());

        assert!(store.get("daily-consumption-2024-05-01").is_some());
    }

    #[test]
    fn test_put_overwrites_previous_entry() {
        let (cache, _, clock) = create_test_cache(at(2024, 5, 1, 12, 0));
        let key = QueryKey::daily_consumption(date(2024, 5, 1));
        cache.put(&key, &sample()).unwrap();

        clock.advance(Duration::minutes(30));
        let newer = TestData {
            name: "newer".to_string(),
            value: 7,
        };
        cache.put(&key, &newer).unwrap();

        let entry = cache.get::<TestData>(&key).unwrap();
        assert_eq!(entry.payload, newer);
        assert_eq!(entry.expires_at, at(2024, 5, 1, 12, 40));
    }

    #[test]
    fn test_corrupt_payload_behaves_as_miss() {
        let (cache, store, _) = create_test_cache(at(2024, 5, 1, 12, 0));
        let key = QueryKey::daily_consumption(date(2024, 5, 1));
        cache.put(&key, &sample()).unwrap();

        store.set("daily-consumption-2024-05-01", "{not json").unwrap();

        assert!(cache.get::<TestData>(&key).is_none());
    }

    #[test]
    fn test_corrupt_or_missing_expiry_behaves_as_miss() {
        let (cache, store, _) = create_test_cache(at(2024, 5, 1, 12, 0));
        let key = QueryKey::daily_consumption(date(2024, 5, 1));
        cache.put(&key, &sample()).unwrap();

        store.set("daily-consumption-2024-05-01-expiry", "soon").unwrap();
        assert!(cache.get::<TestData>(&key).is_none());

        store.remove("daily-consumption-2024-05-01-expiry").unwrap();
        assert!(cache.get::<TestData>(&key).is_none());
    }

    #[test]
    fn test_payload_of_wrong_shape_behaves_as_miss() {
        let (cache, _, _) = create_test_cache(at(2024, 5, 1, 12, 0));
        let key = QueryKey::daily_consumption(date(2024, 5, 1));
        cache.put(&key, &vec![1, 2, 3]).unwrap();

        assert!(cache.get::<TestData>(&key).is_none());
    }

    #[test]
    fn test_bound_evicts_entries_closest_to_expiry() {
        let (cache, store, clock) = create_test_cache(at(2024, 5, 10, 12, 0));
        let cache = cache.with_max_entries(Some(2));

        for day in 1..=3 {
            cache
                .put(&QueryKey::daily_consumption(date(2024, 5, day)), &sample())
                .unwrap();
            clock.advance(Duration::minutes(1));
        }

        assert!(store.get("daily-consumption-2024-05-01").is_none());
        assert!(store.get("daily-consumption-2024-05-01-expiry").is_none());
        assert!(cache
            .get::<TestData>(&QueryKey::daily_consumption(date(2024, 5, 2)))
            .is_some());
        assert!(cache
            .get::<TestData>(&QueryKey::daily_consumption(date(2024, 5, 3)))
            .is_some());
    }

    #[test]
    fn test_bound_evicts_unreadable_expiry_first() {
        let (cache, store, _) = create_test_cache(at(2024, 5, 10, 12, 0));
        let cache = cache.with_max_entries(Some(2));
        for day in [1, 2] {
            cache
                .put(&QueryKey::daily_consumption(date(2024, 5, day)), &sample())
                .unwrap();
        }
        store.set("daily-consumption-2024-05-02-expiry", "garbage").unwrap();

        cache
            .put(&QueryKey::daily_consumption(date(2024, 5, 3)), &sample())
            .unwrap();

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "daily-consumption-2024-05-01",
                "daily-consumption-2024-05-01-expiry",
                "daily-consumption-2024-05-03",
                "daily-consumption-2024-05-03-expiry",
            ]
        );
    }

    #[test]
    fn test_failed_eviction_does_not_fail_put() {
        let store = Arc::new(NoRemoveStore::default());
        let clock = Arc::new(ManualClock::new(at(2024, 5, 10, 12, 0)));
        let cache = CacheManager::new(store.clone(), clock).with_max_entries(Some(1));

        for day in [8, 9] {
            cache
                .put(&QueryKey::daily_consumption(date(2024, 5, day)), &sample())
                .expect("write succeeds even when eviction fails");
        }

        let entry = cache
            .get::<TestData>(&QueryKey::daily_consumption(date(2024, 5, 9)))
            .expect("entry was written");
        assert_eq!(entry.payload, sample());
    }

    #[test]
    fn test_bound_never_evicts_the_entry_just_written() {
        // Today's entry has the earliest expiry but was written last
        let (cache, store, _) = create_test_cache(at(2024, 5, 10, 12, 0));
        let cache = cache.with_max_entries(Some(1));

        cache
            .put(&QueryKey::daily_consumption(date(2024, 5, 9)), &sample())
            .unwrap();
        cache
            .put(&QueryKey::daily_consumption(date(2024, 5, 10)), &sample())
            .unwrap();

        assert!(store.get("daily-consumption-2024-05-10").is_some());
        assert!(store.get("daily-consumption-2024-05-09").is_none());
    }

    #[test]
    fn test_bound_ignores_other_domains() {
        let (cache, store, _) = create_test_cache(at(2024, 5, 10, 12, 0));
        let cache = cache.with_max_entries(Some(1));
        store.set("settings-theme", "dark").unwrap();

        cache
            .put(&QueryKey::daily_consumption(date(2024, 5, 9)), &sample())
            .unwrap();

        assert_eq!(store.get("settings-theme").as_deref(), Some("dark"));
        assert!(store.get("daily-consumption-2024-05-09").is_some());
    }

    #[test]
    fn test_zero_bound_means_unbounded() {
        let (cache, store, _) = create_test_cache(at(2024, 5, 10, 12, 0));
        let cache = cache.with_max_entries(Some(0));

        for day in 1..=5 {
            cache
                .put(&QueryKey::daily_consumption(date(2024, 5, day)), &sample())
                .unwrap();
        }

        assert_eq!(store.keys().len(), 10);
    }
}
