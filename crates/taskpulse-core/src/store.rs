//! In-memory notification store.
//!
//! Records are kept newest-first in insertion order. The unread counter is
//! maintained incrementally: it moves only on insert, mark-read, removal and
//! clear, and it saturates at zero. Every operation is total; unknown ids
//! are ignored.

use std::collections::VecDeque;

use tracing::trace;
use uuid::Uuid;

use crate::models::NotificationRecord;

/// Ordered, session-scoped collection of notifications.
#[derive(Debug, Default, Clone)]
pub struct NotificationStore {
    records: VecDeque<NotificationRecord>,
    unread: usize,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a record. Returns `false` (and changes nothing) if a record
    /// with the same id is already present.
    pub fn insert(&mut self, record: NotificationRecord) -> bool {
        if self.position(record.id).is_some() {
            trace!(notification_id = %record.id, "Duplicate notification id ignored");
            return false;
        }
        if !record.read {
            self.unread += 1;
        }
        self.records.push_front(record);
        true
    }

    /// Mark one record read. Returns whether the record changed.
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) if !record.read => {
                record.read = true;
                self.unread = self.unread.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    /// Mark every record read. Returns how many records changed.
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for record in self.records.iter_mut().filter(|r| !r.read) {
            record.read = true;
            changed += 1;
        }
        self.unread = 0;
        changed
    }

    /// Remove a record regardless of read state.
    pub fn remove(&mut self, id: Uuid) -> Option<NotificationRecord> {
        let index = self.position(id)?;
        let record = self.records.remove(index)?;
        if !record.read {
            self.unread = self.unread.saturating_sub(1);
        }
        Some(record)
    }

    pub fn clear_all(&mut self) {
        self.records.clear();
        self.unread = 0;
    }

    /// Ordered copy of all records, newest first.
    pub fn snapshot(&self) -> Vec<NotificationRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: Uuid) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.position(id).is_some()
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unread_in_snapshot(store: &NotificationStore) -> usize {
        store.snapshot().iter().filter(|r| !r.read).count()
    }

    #[test]
    fn test_insert_is_newest_first() {
        let mut store = NotificationStore::new();
        let a = NotificationRecord::info("A", "a");
        let b = NotificationRecord::info("B", "b");
        let c = NotificationRecord::info("C", "c");
        let ids = [c.id, b.id, a.id];

        store.insert(a);
        store.insert(b);
        store.insert(c);

        let snapshot: Vec<Uuid> = store.snapshot().iter().map(|r| r.id).collect();
        assert_eq!(snapshot, ids);
        assert_eq!(store.unread_count(), 3);
    }

    #[test]
    fn test_mark_read_decrements_once() {
        let mut store = NotificationStore::new();
        let a = NotificationRecord::info("A", "a");
        let id = a.id;
        store.insert(a);

        assert!(store.mark_read(id));
        assert_eq!(store.unread_count(), 0);
        assert!(store.get(id).unwrap().read);

        // Already read: no change
        assert!(!store.mark_read(id));
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_mark_read_absent_id_is_noop() {
        let mut store = NotificationStore::new();
        store.insert(NotificationRecord::info("A", "a"));

        assert!(!store.mark_read(Uuid::new_v4()));
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_mark_all_read() {
        let mut store = NotificationStore::new();
        let a = NotificationRecord::info("A", "a");
        let a_id = a.id;
        store.insert(a);
        store.insert(NotificationRecord::info("B", "b"));
        store.insert(NotificationRecord::info("C", "c"));
        store.mark_read(a_id);

        assert_eq!(store.mark_all_read(), 2);
        assert_eq!(store.unread_count(), 0);
        assert_eq!(unread_in_snapshot(&store), 0);
        assert_eq!(store.mark_all_read(), 0);
    }

    #[test]
    fn test_remove_unread_and_read() {
        let mut store = NotificationStore::new();
        let a = NotificationRecord::info("A", "a");
        let b = NotificationRecord::info("B", "b");
        let (a_id, b_id) = (a.id, b.id);
        store.insert(a);
        store.insert(b);
        store.mark_read(b_id);
        assert_eq!(store.unread_count(), 1);

        // Removing a read record leaves the counter alone
        assert!(store.remove(b_id).is_some());
        assert_eq!(store.unread_count(), 1);

        // Removing an unread record decrements it
        assert!(store.remove(a_id).is_some());
        assert_eq!(store.unread_count(), 0);
        assert!(store.is_empty());

        assert!(store.remove(a_id).is_none());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_clear_all() {
        let mut store = NotificationStore::new();
        for i in 0..5 {
            store.insert(NotificationRecord::info(format!("{}", i), "x"));
        }
        store.clear_all();
        assert!(store.snapshot().is_empty());
        assert_eq!(store.unread_count(), 0);

        // Clearing an empty store is fine
        store.clear_all();
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_duplicate_insert_ignored() {
        let mut store = NotificationStore::new();
        let a = NotificationRecord::info("A", "a");
        assert!(store.insert(a.clone()));
        assert!(!store.insert(a));
        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_insert_already_read_record() {
        let mut store = NotificationStore::new();
        let mut a = NotificationRecord::success("A", "a");
        a.read = true;
        store.insert(a);
        assert_eq!(store.unread_count(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unread_count_matches_snapshot_under_mixed_operations() {
        let mut store = NotificationStore::new();
        let mut ids = Vec::new();

        for i in 0..20 {
            let record = NotificationRecord::info(format!("n{}", i), "body");
            ids.push(record.id);
            store.insert(record);
            assert_eq!(store.unread_count(), unread_in_snapshot(&store));

            // Interleave reads, removals and stray ids
            match i % 4 {
                0 => {
                    store.mark_read(ids[i / 2]);
                }
                1 => {
                    store.remove(ids[i / 3]);
                }
                2 => {
                    store.mark_read(Uuid::new_v4());
                }
                _ => {
                    store.remove(ids[i]);
                    store.mark_read(ids[i]);
                }
            }
            assert_eq!(store.unread_count(), unread_in_snapshot(&store));
        }
    }
}
