//! Notification center: the single loop that owns the notification store.
//!
//! Inbound task events and user commands arrive on two bounded queues and
//! are applied one at a time, so no mutation ever interleaves with another.
//! Pending expiries live in one [`ExpiryQueue`] and a single sleep wakes the
//! loop at the earliest deadline. After each change a fresh
//! [`NotificationSnapshot`] is published on a watch channel for readers.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use taskpulse_core::{
    defaults, ExpiryPolicy, ExpiryQueue, InboundEvent, NotificationRecord, NotificationStore,
    Reconciler,
};

/// Read-only view of the store at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationSnapshot {
    /// Newest first.
    pub records: Vec<NotificationRecord>,
    pub unread_count: usize,
}

impl NotificationSnapshot {
    fn of(store: &NotificationStore) -> Self {
        Self {
            records: store.snapshot(),
            unread_count: store.unread_count(),
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug)]
enum Command {
    Push(NotificationRecord),
    MarkRead(Uuid),
    MarkAllRead,
    Dismiss(Uuid),
    ClearAll,
    Snapshot(oneshot::Sender<NotificationSnapshot>),
    Shutdown,
}

/// Cloneable handle for driving a running [`NotificationCenter`].
///
/// Commands sent after the center stopped are ignored.
#[derive(Debug, Clone)]
pub struct NotificationHandle {
    commands_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<NotificationSnapshot>,
}

impl NotificationHandle {
    /// Insert a locally created notification (e.g. a confirmation message).
    pub async fn push(&self, record: NotificationRecord) {
        self.send(Command::Push(record)).await;
    }

    pub async fn mark_read(&self, id: Uuid) {
        self.send(Command::MarkRead(id)).await;
    }

    pub async fn mark_all_read(&self) {
        self.send(Command::MarkAllRead).await;
    }

    /// Remove one notification regardless of read state.
    pub async fn dismiss(&self, id: Uuid) {
        self.send(Command::Dismiss(id)).await;
    }

    pub async fn clear_all(&self) {
        self.send(Command::ClearAll).await;
    }

    /// Stop the center. Idempotent.
    pub async fn shutdown(&self) {
        self.send(Command::Shutdown).await;
    }

    /// Last published snapshot.
    pub fn snapshot(&self) -> NotificationSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn unread_count(&self) -> usize {
        self.snapshot_rx.borrow().unread_count
    }

    /// Snapshot taken after every command sent before this call has been
    /// applied. `None` if the center has stopped.
    pub async fn sync_snapshot(&self) -> Option<NotificationSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.commands_tx.send(Command::Snapshot(tx)).await.ok()?;
        rx.await.ok()
    }

    /// Receiver that is notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.commands_tx.is_closed()
    }

    async fn send(&self, command: Command) {
        if self.commands_tx.send(command).await.is_err() {
            debug!("Notification center stopped, command ignored");
        }
    }
}

/// Owner of the notification store, expiry queue and reconciler.
pub struct NotificationCenter {
    store: NotificationStore,
    expiry: ExpiryQueue<Instant>,
    policy: ExpiryPolicy,
    reconciler: Reconciler,
    events_rx: mpsc::Receiver<InboundEvent>,
    snapshot_tx: watch::Sender<NotificationSnapshot>,
}

impl NotificationCenter {
    pub fn new(
        reconciler: Reconciler,
        policy: ExpiryPolicy,
        events_rx: mpsc::Receiver<InboundEvent>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(NotificationSnapshot::default());
        Self {
            store: NotificationStore::new(),
            expiry: ExpiryQueue::new(),
            policy,
            reconciler,
            events_rx,
            snapshot_tx,
        }
    }

    /// Spawn the loop and return a handle plus the task's join handle.
    ///
    /// The loop ends on [`NotificationHandle::shutdown`] or once every
    /// handle has been dropped.
    pub fn start(self) -> (NotificationHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(defaults::COMMAND_QUEUE_CAPACITY);
        let handle = NotificationHandle {
            commands_tx,
            snapshot_rx: self.snapshot_tx.subscribe(),
        };
        let task = tokio::spawn(self.run(commands_rx));
        (handle, task)
    }

    #[instrument(skip_all)]
    async fn run(mut self, mut commands_rx: mpsc::Receiver<Command>) {
        info!(
            username = %self.reconciler.current_user(),
            expiry_ms = self.policy.delay.as_millis() as u64,
            cancel_on_read = self.policy.cancel_on_read,
            "Notification center started"
        );

        let mut events_open = true;
        loop {
            let deadline = self.expiry.next_deadline();
            let wake_at = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                command = commands_rx.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                event = self.events_rx.recv(), if events_open => match event {
                    Some(event) => self.reconcile(event),
                    None => {
                        debug!("Event queue closed");
                        events_open = false;
                    }
                },
                _ = sleep_until(wake_at), if deadline.is_some() => {
                    self.expire(Instant::now());
                }
            }
        }

        info!(remaining = self.store.len(), "Notification center stopped");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Push(record) => self.insert(record),
            Command::MarkRead(id) => {
                if self.store.mark_read(id) {
                    if self.policy.cancel_on_read {
                        self.expiry.cancel(id);
                    }
                    self.publish();
                }
            }
            Command::MarkAllRead => {
                if self.store.mark_all_read() > 0 {
                    if self.policy.cancel_on_read {
                        let ids: Vec<Uuid> = self.store.iter().map(|r| r.id).collect();
                        for id in ids {
                            self.expiry.cancel(id);
                        }
                    }
                    self.publish();
                }
            }
            Command::Dismiss(id) => {
                if self.store.remove(id).is_some() {
                    self.expiry.cancel(id);
                    debug!(notification_id = %id, "Notification dismissed");
                    self.publish();
                }
            }
            Command::ClearAll => {
                self.store.clear_all();
                self.expiry.clear();
                self.publish();
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(NotificationSnapshot::of(&self.store));
            }
            Command::Shutdown => {}
        }
    }

    fn reconcile(&mut self, event: InboundEvent) {
        if let Some(record) = self.reconciler.reconcile_inbound(&event) {
            debug!(
                event = %event.kind,
                notification_id = %record.id,
                task_id = record.source_task_id.as_deref().unwrap_or("-"),
                "Event reconciled"
            );
            self.insert(record);
        }
    }

    fn insert(&mut self, record: NotificationRecord) {
        let id = record.id;
        if !self.store.insert(record) {
            return;
        }
        self.expiry.schedule(id, Instant::now() + self.policy.delay);
        trace!(notification_id = %id, unread_count = self.store.unread_count(), "Notification inserted");
        self.publish();
    }

    fn expire(&mut self, now: Instant) {
        let due = self.expiry.drain_due(now);
        let expired_count = due
            .into_iter()
            .filter(|id| self.store.remove(*id).is_some())
            .count();
        if expired_count > 0 {
            debug!(expired_count, unread_count = self.store.unread_count(), "Notifications expired");
            self.publish();
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(NotificationSnapshot::of(&self.store));
    }
}
