use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{CacheRecord, StockSnapshot, WeatherState};

/// Holds the single current [`CacheRecord`], replaced as a unit by successful
/// refresh cycles. Reads take the lock only long enough to clone an `Arc`, so
/// they never wait on a slow fetch; a reader always sees a snapshot, weather
/// and timestamp produced by the same replace.
pub struct SnapshotCache {
    record: RwLock<Arc<CacheRecord>>,
}

impl SnapshotCache {
    /// Starts with the seed record: all categories present and empty, no
    /// weather, no timestamp.
    pub fn new() -> Self {
        Self::seeded(CacheRecord::seed())
    }

    pub fn seeded(record: CacheRecord) -> Self {
        Self {
            record: RwLock::new(Arc::new(record)),
        }
    }

    pub async fn read(&self) -> Arc<CacheRecord> {
        Arc::clone(&*self.record.read().await)
    }

    pub async fn replace(&self, snapshot: StockSnapshot, weather: WeatherState) {
        let record = Arc::new(CacheRecord {
            snapshot,
            weather,
            fetched_at: Some(Utc::now()),
        });
        *self.record.write().await = record;
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Item};

    #[tokio::test]
    async fn test_read_before_first_replace_returns_seed() {
        let cache = SnapshotCache::new();
        let record = cache.read().await;
        assert!(record.fetched_at.is_none());
        assert_eq!(record.snapshot.total_items(), 0);
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_record() {
        let cache = SnapshotCache::new();
        let mut snapshot = StockSnapshot::empty();
        snapshot.push(Category::Seeds, Item::new("Carrot", 10));

        cache.replace(snapshot, WeatherState::default()).await;

        let record = cache.read().await;
        assert!(record.fetched_at.is_some());
        assert_eq!(
            record.snapshot.items(Category::Seeds),
            &[Item::new("Carrot", 10)]
        );
    }

    #[tokio::test]
    async fn test_old_readers_keep_their_record() {
        let cache = SnapshotCache::new();
        let before = cache.read().await;

        let mut snapshot = StockSnapshot::empty();
        snapshot.push(Category::Gears, Item::new("Trowel", 1));
        cache.replace(snapshot, WeatherState::default()).await;

        // The Arc handed out earlier is unchanged by the swap.
        assert_eq!(before.snapshot.total_items(), 0);
        assert_eq!(cache.read().await.snapshot.total_items(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_reads_see_consistent_records() {
        let cache = Arc::new(SnapshotCache::new());

        let writer = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for i in 0..100u32 {
                    let mut snapshot = StockSnapshot::empty();
                    snapshot.push(Category::Seeds, Item::new("Carrot", i));
                    let mut weather = WeatherState::default();
                    weather.current = Some(format!("Rain {i}"));
                    cache.replace(snapshot, weather).await;
                }
            })
        };

        let reader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for _ in 0..100 {
                    let record = cache.read().await;
                    // Snapshot and weather must come from the same replace.
                    if let Some(current) = &record.weather.current {
                        let i: u32 = current.strip_prefix("Rain ").unwrap().parse().unwrap();
                        assert_eq!(
                            record.snapshot.items(Category::Seeds),
                            &[Item::new("Carrot", i)]
                        );
                    } else {
                        assert_eq!(record.snapshot.total_items(), 0);
                    }
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
    }
}
