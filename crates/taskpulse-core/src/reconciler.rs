//! Translation of inbound task events into notification records.
//!
//! Only events addressed to the current user produce a record; everything
//! else is dropped, not queued. The reconciler holds no state besides the
//! username it filters on.

use tracing::debug;

use crate::models::{InboundEvent, NotificationRecord, TaskEvent, TaskEventKind};

/// Interest filter and event-to-notification mapping for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciler {
    current_user: String,
}

impl Reconciler {
    pub fn new(current_user: impl Into<String>) -> Self {
        Self {
            current_user: current_user.into(),
        }
    }

    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    /// Produce a notification for `event` if it is addressed to the current user.
    pub fn reconcile(&self, kind: TaskEventKind, event: &TaskEvent) -> Option<NotificationRecord> {
        if event.assigned_to != self.current_user {
            debug!(
                event = %kind,
                assigned_to = %event.assigned_to,
                "Event not addressed to current user, dropped"
            );
            return None;
        }

        let record = match kind {
            TaskEventKind::Assigned => NotificationRecord::info(
                "New Task Assigned",
                format!("You have been assigned to \"{}\"", event.title),
            ),
            TaskEventKind::Updated => NotificationRecord::info(
                "Task Updated",
                format!("Task \"{}\" has been updated", event.title),
            ),
            TaskEventKind::Done => NotificationRecord::success(
                "Task Completed",
                format!("Task \"{}\" has been marked as completed", event.title),
            ),
        };

        Some(match &event.task_id {
            Some(task_id) => record.with_source_task(task_id.clone()),
            None => record,
        })
    }

    /// Reconcile a raw channel event. Malformed payloads yield `None`.
    pub fn reconcile_inbound(&self, inbound: &InboundEvent) -> Option<NotificationRecord> {
        match serde_json::from_value::<TaskEvent>(inbound.payload.clone()) {
            Ok(event) => self.reconcile(inbound.kind, &event),
            Err(e) => {
                debug!(event = %inbound.kind, error = %e, "Malformed event payload dropped");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use serde_json::json;

    fn write_docs(assigned_to: &str) -> TaskEvent {
        TaskEvent {
            task_id: Some("t1".to_string()),
            title: "Write docs".to_string(),
            assigned_to: assigned_to.to_string(),
        }
    }

    #[test]
    fn test_matching_user_produces_info_record() {
        let reconciler = Reconciler::new("alice");
        let record = reconciler
            .reconcile(TaskEventKind::Assigned, &write_docs("alice"))
            .expect("record for alice");

        assert_eq!(record.kind, NotificationKind::Info);
        assert_eq!(record.title, "New Task Assigned");
        assert!(record.message.contains("Write docs"));
        assert_eq!(record.source_task_id.as_deref(), Some("t1"));
        assert!(!record.read);
    }

    #[test]
    fn test_other_user_produces_nothing() {
        let reconciler = Reconciler::new("bob");
        assert!(reconciler
            .reconcile(TaskEventKind::Assigned, &write_docs("alice"))
            .is_none());
    }

    #[test]
    fn test_kind_mapping() {
        let reconciler = Reconciler::new("alice");
        let event = write_docs("alice");

        let updated = reconciler.reconcile(TaskEventKind::Updated, &event).unwrap();
        assert_eq!(updated.kind, NotificationKind::Info);
        assert_eq!(updated.message, "Task \"Write docs\" has been updated");

        let done = reconciler.reconcile(TaskEventKind::Done, &event).unwrap();
        assert_eq!(done.kind, NotificationKind::Success);
        assert_eq!(done.title, "Task Completed");
    }

    #[test]
    fn test_fresh_id_per_event() {
        let reconciler = Reconciler::new("alice");
        let event = write_docs("alice");
        let a = reconciler.reconcile(TaskEventKind::Updated, &event).unwrap();
        let b = reconciler.reconcile(TaskEventKind::Updated, &event).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_username_match_is_exact() {
        let reconciler = Reconciler::new("alice");
        assert!(reconciler
            .reconcile(TaskEventKind::Assigned, &write_docs("Alice"))
            .is_none());
    }

    #[test]
    fn test_inbound_without_task_id() {
        let reconciler = Reconciler::new("alice");
        let inbound = InboundEvent {
            kind: TaskEventKind::Done,
            payload: json!({ "title": "Deploy", "assignedTo": "alice" }),
        };
        let record = reconciler.reconcile_inbound(&inbound).unwrap();
        assert!(record.source_task_id.is_none());
        assert!(record.message.contains("Deploy"));
    }

    #[test]
    fn test_malformed_inbound_dropped() {
        let reconciler = Reconciler::new("alice");
        let payloads = [
            json!({ "taskId": "t1", "title": "No assignee" }),
            json!({ "taskId": "t1", "assignedTo": "alice" }),
            json!({ "title": 42, "assignedTo": "alice" }),
            json!("task:assigned"),
            json!(null),
        ];
        for payload in payloads {
            let inbound = InboundEvent {
                kind: TaskEventKind::Assigned,
                payload,
            };
            assert!(reconciler.reconcile_inbound(&inbound).is_none());
        }
    }
}
