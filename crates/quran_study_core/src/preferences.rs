//! The last-read marker, mirrored in memory and persisted through `PreferencesStore`.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{Chapter, LastReadMarker};
use crate::ports::{PortResult, PreferencesStore};

pub struct SessionPreferences {
    store: Arc<dyn PreferencesStore>,
    last_read: Option<LastReadMarker>,
}

impl SessionPreferences {
    pub fn new(store: Arc<dyn PreferencesStore>) -> Self {
        Self {
            store,
            last_read: None,
        }
    }

    /// Reads the stored marker once. A missing marker is not an error.
    pub async fn load_last_read(&mut self) -> PortResult<Option<LastReadMarker>> {
        self.last_read = self.store.load_last_read().await?;
        Ok(self.last_read.clone())
    }

    pub fn last_read(&self) -> Option<&LastReadMarker> {
        self.last_read.as_ref()
    }

    pub async fn record_last_read(&mut self, chapter: &Chapter) -> PortResult<LastReadMarker> {
        self.record_at(chapter, Utc::now()).await
    }

    /// Overwrites the marker. The timestamp never goes backwards, even if the clock does.
    pub async fn record_at(&mut self, chapter: &Chapter, now: DateTime<Utc>) -> PortResult<LastReadMarker> {
        let timestamp = match &self.last_read {
            Some(previous) if previous.timestamp > now => previous.timestamp,
            _ => now,
        };
        let marker = LastReadMarker {
            chapter_id: chapter.id,
            chapter_name: chapter.name.clone(),
            timestamp,
        };
        self.store.save_last_read(&marker).await?;
        self.last_read = Some(marker.clone());
        Ok(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::chapter;
    use crate::ports::PortError;
    use async_trait::async_trait;
    use chrono::Duration;
    use futures::executor::block_on;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<Option<LastReadMarker>>,
    }

    #[async_trait]
    impl PreferencesStore for MemoryStore {
        async fn load_last_read(&self) -> PortResult<Option<LastReadMarker>> {
            Ok(self.saved.lock().unwrap().clone())
        }

        async fn save_last_read(&self, marker: &LastReadMarker) -> PortResult<()> {
            *self.saved.lock().unwrap() = Some(marker.clone());
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl PreferencesStore for FailingStore {
        async fn load_last_read(&self) -> PortResult<Option<LastReadMarker>> {
            Ok(None)
        }

        async fn save_last_read(&self, _marker: &LastReadMarker) -> PortResult<()> {
            Err(PortError::Unexpected("disk full".to_string()))
        }
    }

    #[test]
    fn absence_yields_no_marker() {
        let mut prefs = SessionPreferences::new(Arc::new(MemoryStore::default()));
        assert_eq!(block_on(prefs.load_last_read()).unwrap(), None);
        assert!(prefs.last_read().is_none());
    }

    #[test]
    fn later_write_wins_with_non_decreasing_timestamp() {
        let store = Arc::new(MemoryStore::default());
        let mut prefs = SessionPreferences::new(store.clone());
        let a = block_on(prefs.record_last_read(&chapter(1, "الفاتحة"))).unwrap();
        let b = block_on(prefs.record_last_read(&chapter(2, "البقرة"))).unwrap();

        let stored = store.saved.lock().unwrap().clone().unwrap();
        assert_eq!(stored, b);
        assert_eq!(stored.chapter_id, 2);
        assert_eq!(stored.chapter_name, "البقرة");
        assert!(stored.timestamp >= a.timestamp);
    }

    #[test]
    fn clock_going_backwards_keeps_previous_timestamp() {
        let store = Arc::new(MemoryStore::default());
        let mut prefs = SessionPreferences::new(store);
        let now = Utc::now();
        block_on(prefs.record_at(&chapter(1, "الفاتحة"), now)).unwrap();
        let second = block_on(prefs.record_at(&chapter(2, "البقرة"), now - Duration::seconds(30))).unwrap();
        assert_eq!(second.timestamp, now);
    }

    #[test]
    fn failed_save_leaves_mirror_untouched() {
        let mut prefs = SessionPreferences::new(Arc::new(FailingStore));
        assert!(block_on(prefs.record_last_read(&chapter(18, "الكهف"))).is_err());
        assert!(prefs.last_read().is_none());
    }

    #[test]
    fn load_mirrors_stored_value() {
        let store = Arc::new(MemoryStore::default());
        {
            let mut writer = SessionPreferences::new(store.clone());
            block_on(writer.record_last_read(&chapter(36, "يس"))).unwrap();
        }
        let mut reader = SessionPreferences::new(store);
        let loaded = block_on(reader.load_last_read()).unwrap().unwrap();
        assert_eq!(loaded.chapter_id, 36);
        assert_eq!(reader.last_read(), Some(&loaded));
    }
}
