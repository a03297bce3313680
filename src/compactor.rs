use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::store::{Store, StoreError};

const CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Compact once the WAL has grown by `threshold` appends. Returns whether it ran.
pub async fn compact_if_needed(store: &Store, threshold: u64) -> Result<bool, StoreError> {
    let appends = store.wal_appends_since_compact().await;
    if appends < threshold {
        return Ok(false);
    }
    store.compact_wal().await?;
    info!("compacted wal after {appends} appends");
    Ok(true)
}

/// Background task that keeps the WAL from growing without bound.
pub async fn run_compactor(store: Arc<Store>, threshold: u64) {
    let mut interval = tokio::time::interval(CHECK_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = compact_if_needed(&store, threshold).await {
            tracing::warn!("wal compaction failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("gymsched_test_compactor");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[tokio::test]
    async fn compacts_only_past_threshold() {
        let path = test_wal_path("threshold.wal");
        let store = Store::open(path.clone(), chrono_tz::Asia::Kolkata).unwrap();
        store.create_center(1, "Downtown".into()).await.unwrap();
        store
            .create_template(5, 1, "Zumba".into(), None, 30)
            .await
            .unwrap();

        assert!(!compact_if_needed(&store, 3).await.unwrap());
        assert_eq!(store.wal_appends_since_compact().await, 2);

        store
            .add_holiday(
                1,
                "Holi".into(),
                chrono::NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
                chrono::NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            )
            .await
            .unwrap();
        assert!(compact_if_needed(&store, 3).await.unwrap());
        assert_eq!(store.wal_appends_since_compact().await, 0);

        drop(store);
        let reopened = Store::open(path, chrono_tz::Asia::Kolkata).unwrap();
        let centers = reopened.list_centers().await;
        assert_eq!(centers.len(), 1);
        assert_eq!(centers[0].template_count, 1);
        assert_eq!(centers[0].holiday_count, 1);
    }
}
