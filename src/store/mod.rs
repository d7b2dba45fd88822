/// Notification store
///
/// The single mutation point for the notification list and unread counter.
/// Arbitrates between three inputs: the bulk-fetch snapshot, push-channel
/// events, and local user actions, with idempotent, order-tolerant rules.
use tokio::sync::mpsc;
use tracing::debug;

use crate::models::Notification;

/// Events emitted to store subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A push event resulted in a genuine insert
    NotificationAdded(Notification),
    /// The derived or externally-confirmed unread count changed
    UnreadCountChanged(u64),
    /// The list was replaced wholesale by a bulk fetch or resync
    SnapshotLoaded { total: usize },
}

/// Ordered notification list plus unread counter, keyed by id
///
/// Presented newest-first: pushes prepend, snapshots keep server order.
/// No duplicate id ever coexists in the list.
#[derive(Default)]
pub struct NotificationStore {
    notifications: Vec<Notification>,
    unread_count: u64,
    subscribers: Vec<mpsc::UnboundedSender<StoreEvent>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a subscriber. Closed subscribers are pruned on the next emit.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    /// Replace the list wholesale from an authoritative snapshot.
    ///
    /// The only operation allowed to shrink the list; it wins over any
    /// pending optimistic local state it does not re-confirm.
    pub fn load_snapshot(&mut self, notifications: Vec<Notification>, unread_count: u64) {
        let total = notifications.len();
        self.notifications = notifications;
        self.unread_count = unread_count;
        debug!(total, unread_count, "snapshot loaded");
        self.emit(StoreEvent::SnapshotLoaded { total });
        self.emit(StoreEvent::UnreadCountChanged(unread_count));
    }

    /// Insert a pushed notification at the head of the list.
    ///
    /// Duplicate arrivals (a reconnect replaying a recent event) are
    /// silently dropped: not re-inserted, not re-counted. Returns whether
    /// a genuine insert happened.
    pub fn ingest_push(&mut self, notification: Notification) -> bool {
        if self.notifications.iter().any(|n| n.id == notification.id) {
            debug!(id = %notification.id, "dropping duplicate push");
            return false;
        }

        self.unread_count += 1;
        self.notifications.insert(0, notification.clone());
        self.emit(StoreEvent::NotificationAdded(notification));
        self.emit(StoreEvent::UnreadCountChanged(self.unread_count));
        true
    }

    /// Optimistically flip one notification to read.
    ///
    /// Applied before the confirming round trip; never rolled back. The
    /// next snapshot corrects any drift. Returns whether state changed.
    pub fn mark_read(&mut self, id: &str) -> bool {
        let Some(notification) = self
            .notifications
            .iter_mut()
            .find(|n| n.id == id && !n.is_read)
        else {
            return false;
        };

        notification.is_read = true;
        self.unread_count = self.unread_count.saturating_sub(1);
        let count = self.unread_count;
        self.emit(StoreEvent::UnreadCountChanged(count));
        true
    }

    /// Optimistically flip every notification to read and zero the count.
    pub fn mark_all_read(&mut self) {
        for notification in &mut self.notifications {
            notification.is_read = true;
        }
        self.unread_count = 0;
        self.emit(StoreEvent::UnreadCountChanged(0));
    }

    /// Remove one notification immediately.
    ///
    /// Unread accounting is NOT adjusted here: the deleted entry's local
    /// read state is not guaranteed accurate, so the caller follows up
    /// with an authoritative count refresh via `set_unread_count`.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        before != self.notifications.len()
    }

    /// Apply an externally-confirmed unread count (init frame or the
    /// unread-count endpoint). The authoritative value always wins.
    pub fn set_unread_count(&mut self, unread_count: u64) {
        if self.unread_count != unread_count {
            self.unread_count = unread_count;
            self.emit(StoreEvent::UnreadCountChanged(unread_count));
        }
    }

    /// Logout teardown: drop everything.
    pub fn clear(&mut self) {
        self.notifications.clear();
        if self.unread_count != 0 {
            self.unread_count = 0;
            self.emit(StoreEvent::UnreadCountChanged(0));
        }
    }

    fn emit(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationCategory;
    use chrono::{TimeZone, Utc};

    fn notification(id: &str, is_read: bool) -> Notification {
        Notification {
            id: id.to_string(),
            title: format!("title {id}"),
            message: format!("message {id}"),
            category: NotificationCategory::Info,
            is_read,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_ingest_push_prepends_and_counts() {
        let mut store = NotificationStore::new();
        assert!(store.ingest_push(notification("n1", false)));
        assert!(store.ingest_push(notification("n2", false)));

        let ids: Vec<&str> = store.notifications().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n2", "n1"]);
        assert_eq!(store.unread_count(), 2);
    }

    #[test]
    fn test_duplicate_pushes_are_dropped() {
        let mut store = NotificationStore::new();
        // Duplicates interleaved among unique ids: each id exactly once,
        // count equals the number of unique insertions.
        for id in ["n1", "n2", "n1", "n3", "n2", "n1"] {
            store.ingest_push(notification(id, false));
        }

        let ids: Vec<&str> = store.notifications().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n3", "n2", "n1"]);
        assert_eq!(store.unread_count(), 3);
    }

    #[test]
    fn test_load_snapshot_replaces_everything() {
        let mut store = NotificationStore::new();
        store.ingest_push(notification("stale-1", false));
        store.ingest_push(notification("stale-2", false));

        let snapshot = vec![notification("s1", false), notification("s2", true)];
        store.load_snapshot(snapshot.clone(), 1);

        assert_eq!(store.notifications(), snapshot.as_slice());
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_load_snapshot_may_shrink_to_empty() {
        let mut store = NotificationStore::new();
        store.ingest_push(notification("n1", false));
        store.load_snapshot(Vec::new(), 0);
        assert!(store.notifications().is_empty());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let mut store = NotificationStore::new();
        store.ingest_push(notification("n1", false));

        assert!(store.mark_read("n1"));
        assert_eq!(store.unread_count(), 0);
        assert!(store.notifications()[0].is_read);

        // Second flip changes nothing and cannot underflow the count.
        assert!(!store.mark_read("n1"));
        assert_eq!(store.unread_count(), 0);

        assert!(!store.mark_read("missing"));
    }

    #[test]
    fn test_unread_count_floors_at_zero() {
        let mut store = NotificationStore::new();
        // Snapshot with a count the list does not back up: the externally
        // confirmed value is taken as-is, and marking read saturates.
        store.load_snapshot(vec![notification("n1", false)], 0);
        assert!(store.mark_read("n1"));
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_mark_all_read() {
        let mut store = NotificationStore::new();
        store.ingest_push(notification("n1", false));
        store.ingest_push(notification("n2", false));

        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
        assert!(store.notifications().iter().all(|n| n.is_read));
    }

    #[test]
    fn test_mark_all_read_on_empty_store() {
        let mut store = NotificationStore::new();
        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_delete_leaves_count_to_authoritative_refresh() {
        let mut store = NotificationStore::new();
        store.ingest_push(notification("n1", false));
        store.ingest_push(notification("n2", false));
        assert_eq!(store.unread_count(), 2);

        assert!(store.delete("n1"));
        let ids: Vec<&str> = store.notifications().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n2"]);
        // No local arithmetic on delete.
        assert_eq!(store.unread_count(), 2);

        // The follow-up authoritative refresh corrects it.
        store.set_unread_count(1);
        assert_eq!(store.unread_count(), 1);

        assert!(!store.delete("n1"));
    }

    #[test]
    fn test_init_count_wins_over_disconnected_interval_pushes() {
        let mut store = NotificationStore::new();
        store.ingest_push(notification("n1", false));
        store.ingest_push(notification("n2", false));
        assert_eq!(store.unread_count(), 2);

        // Reconnect delivers a fresh authoritative count before any push
        // on the new channel is ingested.
        store.set_unread_count(5);
        assert_eq!(store.unread_count(), 5);
    }

    #[test]
    fn test_deleted_id_may_reappear_via_new_arrival() {
        let mut store = NotificationStore::new();
        store.ingest_push(notification("n1", false));
        assert!(store.delete("n1"));
        assert!(store.ingest_push(notification("n1", false)));
        assert_eq!(store.notifications().len(), 1);
    }

    #[test]
    fn test_subscribers_receive_events_in_order() {
        let mut store = NotificationStore::new();
        let mut events = store.subscribe();

        store.ingest_push(notification("n1", false));
        store.mark_all_read();

        assert!(matches!(
            events.try_recv().unwrap(),
            StoreEvent::NotificationAdded(n) if n.id == "n1"
        ));
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::UnreadCountChanged(1)
        );
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::UnreadCountChanged(0)
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_clear_resets_list_and_count() {
        let mut store = NotificationStore::new();
        store.ingest_push(notification("n1", false));
        store.clear();
        assert!(store.notifications().is_empty());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_closed_subscribers_are_pruned() {
        let mut store = NotificationStore::new();
        let events = store.subscribe();
        drop(events);
        // Must not fail or grow unbounded.
        store.ingest_push(notification("n1", false));
        assert!(store.subscribers.is_empty());
    }
}
