// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Live value store.
//!
//! Thread-safe mapping from tag identifier to the latest known value.
//! Writers are the notification ingestion path and the subscription
//! registry; readers are the presentation layer and the export builder.
//! A record is always replaced as one unit, so no reader ever observes a
//! value without its matching timestamp.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use tagbridge_core::types::{LiveValue, TagId};

// =============================================================================
// LiveValueStore
// =============================================================================

/// Concurrently readable map of the latest value per subscribed tag.
#[derive(Debug, Default)]
pub struct LiveValueStore {
    values: RwLock<HashMap<TagId, LiveValue>>,
}

impl LiveValueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the pending placeholder for a freshly subscribed tag.
    pub fn insert_pending(&self, tag_id: &TagId) {
        self.write().insert(tag_id.clone(), LiveValue::pending());
    }

    /// Upserts a tag's value and timestamp as one unit.
    ///
    /// An update strictly older than the stored timestamp for the same tag
    /// is ignored, so concurrent deliveries cannot regress a tag to an
    /// earlier value. Returns `true` if the update was applied.
    pub fn update(
        &self,
        tag_id: &TagId,
        value: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> bool {
        let mut values = self.write();
        match values.get(tag_id) {
            Some(current) if !current.is_pending() && current.timestamp > timestamp => false,
            _ => {
                values.insert(tag_id.clone(), LiveValue::new(value, timestamp));
                true
            }
        }
    }

    /// Returns the latest value for a tag, if any update (or the pending
    /// placeholder) has been recorded.
    pub fn read(&self, tag_id: &TagId) -> Option<LiveValue> {
        self.read_lock().get(tag_id).cloned()
    }

    /// Returns all entries, ordered by tag identifier for stable display.
    pub fn read_all(&self) -> Vec<(TagId, LiveValue)> {
        let mut entries: Vec<(TagId, LiveValue)> = self
            .read_lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        entries
    }

    /// Removes a tag's entry. A no-op when absent.
    pub fn remove(&self, tag_id: &TagId) {
        self.write().remove(tag_id);
    }

    /// Empties the store.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Returns the number of tracked tags.
    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    /// Returns `true` if no tags are tracked.
    pub fn is_empty(&self) -> bool {
        self.read_lock().is_empty()
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TagId, LiveValue>> {
        self.values.read().expect("live value store poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<TagId, LiveValue>> {
        self.values.write().expect("live value store poisoned")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn tag(s: &str) -> TagId {
        TagId::new(s)
    }

    #[test]
    fn test_pending_then_update() {
        let store = LiveValueStore::new();
        let id = tag("Area1.Temp");

        store.insert_pending(&id);
        assert!(store.read(&id).unwrap().is_pending());

        let now = Utc::now();
        assert!(store.update(&id, "72.3", now));

        let live = store.read(&id).unwrap();
        assert_eq!(live.value, "72.3");
        assert_eq!(live.timestamp, now);
    }

    #[test]
    fn test_stale_update_ignored() {
        let store = LiveValueStore::new();
        let id = tag("Area1.Temp");
        let now = Utc::now();

        assert!(store.update(&id, "new", now));
        assert!(!store.update(&id, "old", now - chrono::Duration::seconds(5)));
        assert_eq!(store.read(&id).unwrap().value, "new");
    }

    #[test]
    fn test_update_replaces_pending_regardless_of_timestamp() {
        let store = LiveValueStore::new();
        let id = tag("Area1.Temp");

        store.insert_pending(&id);
        // A source timestamp may predate the pending placeholder's wall
        // clock; the first real value always wins over the placeholder.
        let past = Utc::now() - chrono::Duration::seconds(30);
        assert!(store.update(&id, "72.3", past));
        assert_eq!(store.read(&id).unwrap().value, "72.3");
    }

    #[test]
    fn test_remove_and_clear() {
        let store = LiveValueStore::new();
        store.update(&tag("A.1"), "1", Utc::now());
        store.update(&tag("A.2"), "2", Utc::now());
        assert_eq!(store.len(), 2);

        store.remove(&tag("A.1"));
        assert!(store.read(&tag("A.1")).is_none());

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_read_all_sorted() {
        let store = LiveValueStore::new();
        store.update(&tag("B.1"), "b", Utc::now());
        store.update(&tag("A.1"), "a", Utc::now());

        let all = store.read_all();
        assert_eq!(all[0].0.as_str(), "A.1");
        assert_eq!(all[1].0.as_str(), "B.1");
    }

    #[test]
    fn test_concurrent_updates_keep_greatest_timestamp() {
        let store = Arc::new(LiveValueStore::new());
        let base = Utc::now();

        // 10 tags x 10 updates each with increasing timestamps, delivered
        // from concurrent threads in arbitrary interleavings.
        let tags: Vec<TagId> = (0..10).map(|i| tag(&format!("Area1.Tag{}", i))).collect();
        let mut handles = Vec::new();
        for step in 0..10 {
            let store = Arc::clone(&store);
            let tags = tags.clone();
            handles.push(std::thread::spawn(move || {
                for id in &tags {
                    let ts = base + chrono::Duration::milliseconds(step);
                    store.update(id, format!("v{}", step), ts);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for id in &tags {
            let live = store.read(id).unwrap();
            assert_eq!(live.value, "v9");
            assert_eq!(live.timestamp, base + chrono::Duration::milliseconds(9));
        }
    }
}
