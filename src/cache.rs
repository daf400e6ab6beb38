use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::forecast::ProcessedForecast;
use crate::locations::normalize_key;

/// A thread-safe map whose entries expire after a fixed TTL
pub struct TtlCache<K, V> {
    data: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<K, V> TtlCache<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            ttl,
        }
    }

    /// Live value for `key`; an expired entry is evicted on access
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.data.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.data.remove(key);
            None
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.data.insert(key, entry);
    }

    pub fn cleanup(&self) {
        let now = Instant::now();
        self.data.retain(|_, entry| entry.expires_at > now);
    }

    /// Includes entries that expired but were not evicted yet
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Processed forecasts keyed by `location:local-date`
pub type ForecastCache = Arc<TtlCache<String, Arc<ProcessedForecast>>>;

pub fn create_forecast_cache(ttl: Duration) -> ForecastCache {
    Arc::new(TtlCache::new(ttl))
}

/// A forecast is only valid for the local day it was processed on
pub fn forecast_cache_key(location_key: &str, today: NaiveDate) -> String {
    format!("{}:{}", normalize_key(location_key), today)
}

/// Evict expired forecasts every `every`
pub fn start_cache_cleanup_task(cache: ForecastCache, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let before = cache.len();
            cache.cleanup();
            let after = cache.len();
            if before != after {
                tracing::debug!(
                    removed = before - after,
                    remaining = after,
                    "Forecast cache cleanup completed"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::processing::test_support::forecast_from_hours;

    #[test]
    fn test_forecast_round_trips_through_cache() {
        let cache = create_forecast_cache(Duration::from_secs(60));
        let forecast = Arc::new(forecast_from_hours("gijon", vec![]));
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        cache.insert(forecast_cache_key("gijon", day), forecast.clone());
        let hit = cache.get(&forecast_cache_key("Gijon", day)).unwrap();
        assert!(Arc::ptr_eq(&hit, &forecast));
    }

    #[test]
    fn test_next_day_misses() {
        let cache = create_forecast_cache(Duration::from_secs(60));
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let next = day.succ_opt().unwrap();

        cache.insert(
            forecast_cache_key("gijon", day),
            Arc::new(forecast_from_hours("gijon", vec![])),
        );
        assert!(cache.get(&forecast_cache_key("gijon", next)).is_none());
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(1));
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.len(), 1);
        cache.cleanup();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_forecast_cache_key_format() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(forecast_cache_key("  Oviedo ", day), "oviedo:2024-06-01");
    }
}
