//! Deduplicating tag store
//!
//! Keeps the first record seen for each tag id, in insertion order. The
//! store only grows until it is cleared at the start of a new session.
//! Not synchronized; the session controller serializes access.

use std::collections::HashSet;

use tagsense_common::{TagCounterSnapshot, TagRecord};

#[derive(Debug, Default)]
pub struct TagStore {
    tags: Vec<TagRecord>,
    seen: HashSet<String>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` unless its tag id is already present
    ///
    /// Returns whether the record was added. An existing record is never
    /// replaced.
    pub fn insert_if_new(&mut self, record: TagRecord) -> bool {
        if !self.seen.insert(record.tag_id.clone()) {
            return false;
        }
        self.tags.push(record);
        true
    }

    pub fn contains(&self, tag_id: &str) -> bool {
        self.seen.contains(tag_id)
    }

    pub fn count(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.seen.clear();
    }

    /// Copy of the current contents against the given threshold
    pub fn snapshot(&self, threshold: u32) -> TagCounterSnapshot {
        let current_count = self.count();
        TagCounterSnapshot {
            current_count,
            threshold_value: threshold,
            threshold_reached: current_count >= threshold as usize,
            tags: self.tags.clone(),
        }
    }

    /// Tags ordered most recent read first
    ///
    /// Records with equal read times keep reverse insertion order.
    pub fn most_recent_first(&self) -> Vec<TagRecord> {
        let mut ordered: Vec<TagRecord> = self.tags.iter().rev().cloned().collect();
        ordered.sort_by(|a, b| b.read_time.cmp(&a.read_time));
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn tag(id: &str, rssi: i32) -> TagRecord {
        TagRecord::new(id, rssi, "1")
    }

    #[test]
    fn test_duplicate_tag_keeps_first_record() {
        let mut store = TagStore::new();
        let first = tag("E2001", -40);
        let first_time = first.read_time;

        assert!(store.insert_if_new(first));
        let later = tag("E2001", -75).with_read_time(first_time + Duration::seconds(5));
        assert!(!store.insert_if_new(later));

        assert_eq!(store.count(), 1);
        let snapshot = store.snapshot(10);
        assert_eq!(snapshot.tags[0].rssi, -40);
        assert_eq!(snapshot.tags[0].read_time, first_time);
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let mut store = TagStore::new();
        for id in ["C", "A", "B"] {
            store.insert_if_new(tag(id, -50));
        }

        let ids: Vec<_> = store.snapshot(10).tags.into_iter().map(|t| t.tag_id).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_snapshot_threshold_flag() {
        let mut store = TagStore::new();
        store.insert_if_new(tag("A", -50));
        store.insert_if_new(tag("B", -50));

        assert!(!store.snapshot(3).threshold_reached);
        assert!(store.snapshot(2).threshold_reached);
        assert!(store.snapshot(1).threshold_reached);
        assert_eq!(store.snapshot(2).threshold_value, 2);
    }

    #[test]
    fn test_clear_forgets_tag_ids() {
        let mut store = TagStore::new();
        store.insert_if_new(tag("A", -50));
        store.clear();

        assert!(store.is_empty());
        assert!(!store.contains("A"));
        assert!(store.insert_if_new(tag("A", -50)));
    }

    #[test]
    fn test_most_recent_first() {
        let mut store = TagStore::new();
        let base = Utc::now();
        store.insert_if_new(tag("old", -50).with_read_time(base - Duration::seconds(10)));
        store.insert_if_new(tag("new", -50).with_read_time(base));
        store.insert_if_new(tag("mid", -50).with_read_time(base - Duration::seconds(5)));

        let ids: Vec<_> = store.most_recent_first().into_iter().map(|t| t.tag_id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }
}
