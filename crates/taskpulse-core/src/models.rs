//! Data models for notifications, inbound task events, and backend resources.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::uuid_utils::new_v7;

// ============================================================================
// Notifications
// ============================================================================

/// Display category of a notification. Carries no behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user-visible notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Client-generated identifier (UUIDv7), unique for the session.
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Task that triggered the notification, if any. Lookup only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_task_id: Option<String>,
    /// Informational; ordering is by insertion, not by this field.
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl NotificationRecord {
    /// Create an unread record with a fresh id and the current timestamp.
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: new_v7(),
            kind,
            title: title.into(),
            message: message.into(),
            source_task_id: None,
            created_at: Utc::now(),
            read: false,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, message)
    }

    /// Attach the id of the task this notification refers to.
    pub fn with_source_task(mut self, task_id: impl Into<String>) -> Self {
        self.source_task_id = Some(task_id.into());
        self
    }
}

// ============================================================================
// Inbound task events
// ============================================================================

/// Named task lifecycle events pushed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskEventKind {
    Assigned,
    Updated,
    Done,
}

impl TaskEventKind {
    /// Every event kind the reconciler is interested in.
    pub const ALL: [TaskEventKind; 3] = [
        TaskEventKind::Assigned,
        TaskEventKind::Updated,
        TaskEventKind::Done,
    ];

    /// Canonical wire name.
    pub fn wire_name(&self) -> &'static str {
        match self {
            TaskEventKind::Assigned => "task:assigned",
            TaskEventKind::Updated => "task:updated",
            TaskEventKind::Done => "task:done",
        }
    }

    /// Parse a wire name. `task:completed` is accepted for older servers.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "task:assigned" => Some(TaskEventKind::Assigned),
            "task:updated" => Some(TaskEventKind::Updated),
            "task:done" | "task:completed" => Some(TaskEventKind::Done),
            _ => None,
        }
    }
}

impl fmt::Display for TaskEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Payload of a task lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub title: String,
    /// Username of the assignee.
    pub assigned_to: String,
}

/// A raw event as delivered by the event channel, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub kind: TaskEventKind,
    pub payload: serde_json::Value,
}

// ============================================================================
// Backend resources
// ============================================================================

/// A user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Token and user returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(Error::InvalidInput(format!("Unknown priority: {}", other))),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "todo", alias = "Todo")]
    Todo,
    #[serde(rename = "in progress", alias = "In Progress", alias = "in-progress")]
    InProgress,
    #[serde(rename = "completed", alias = "Completed")]
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(Error::InvalidInput(format!("Unknown status: {}", other))),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Populated creator. The backend may omit any field but the id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorInfo {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<User> for CreatorInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: Some(user.username),
            email: user.email,
        }
    }
}

/// Creator reference: the backend returns either a bare id or a populated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskCreator {
    Id(String),
    User(CreatorInfo),
}

impl TaskCreator {
    pub fn id(&self) -> &str {
        match self {
            TaskCreator::Id(id) => id,
            TaskCreator::User(info) => &info.id,
        }
    }

    /// Username, else email, else id.
    pub fn display_name(&self) -> &str {
        match self {
            TaskCreator::Id(id) => id,
            TaskCreator::User(info) => info
                .username
                .as_deref()
                .filter(|name| !name.is_empty())
                .or(info.email.as_deref())
                .unwrap_or(&info.id),
        }
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A task as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: TaskPriority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<TaskCreator>,
}

/// Request body for creating or updating a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub assigned_to: String,
    /// Id of the user creating the task.
    pub created_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_record_defaults() {
        let record = NotificationRecord::info("Title", "Body");
        assert_eq!(record.kind, NotificationKind::Info);
        assert!(!record.read);
        assert!(record.source_task_id.is_none());
        assert!(crate::uuid_utils::is_v7(&record.id));
    }

    #[test]
    fn test_notification_ids_are_unique() {
        let a = NotificationRecord::success("a", "a");
        let b = NotificationRecord::success("a", "a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_notification_kind_json() {
        let record = NotificationRecord::error("Error", "boom").with_source_task("t1");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["source_task_id"], "t1");
    }

    #[test]
    fn test_event_kind_wire_names() {
        for kind in TaskEventKind::ALL {
            assert_eq!(TaskEventKind::from_wire(kind.wire_name()), Some(kind));
        }
        assert_eq!(
            TaskEventKind::from_wire("task:completed"),
            Some(TaskEventKind::Done)
        );
        assert_eq!(TaskEventKind::from_wire("task:deleted"), None);
    }

    #[test]
    fn test_task_event_camel_case() {
        let event: TaskEvent = serde_json::from_value(serde_json::json!({
            "taskId": "t1",
            "title": "Write docs",
            "assignedTo": "alice",
            "extra": true
        }))
        .unwrap();
        assert_eq!(event.task_id.as_deref(), Some("t1"));
        assert_eq!(event.assigned_to, "alice");
    }

    #[test]
    fn test_task_deserialize_backend_shape() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "_id": "665f",
            "title": "Ship it",
            "description": "Release 1.0",
            "dueDate": "2026-10-01T00:00:00Z",
            "priority": "High",
            "status": "in progress",
            "assignedTo": "alice",
            "createdBy": { "_id": "u1", "username": "bob" }
        }))
        .unwrap();
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.created_by.as_ref().map(|c| c.id()), Some("u1"));

        let bare: Task = serde_json::from_value(serde_json::json!({
            "_id": "1",
            "title": "t",
            "createdBy": "u2"
        }))
        .unwrap();
        assert_eq!(bare.created_by.as_ref().map(|c| c.id()), Some("u2"));
        assert_eq!(bare.status, TaskStatus::Todo);
        assert_eq!(bare.priority, TaskPriority::Medium);
    }

    #[test]
    fn test_creator_without_username_falls_back_to_email() {
        let tasks: Vec<Task> = serde_json::from_value(serde_json::json!([
            {"_id": "1", "title": "ok"},
            {"_id": "2", "title": "odd", "createdBy": {"_id": "u1", "email": "b@x"}}
        ]))
        .unwrap();
        assert_eq!(tasks.len(), 2);

        let creator = tasks[1].created_by.as_ref().unwrap();
        assert_eq!(creator.id(), "u1");
        assert_eq!(creator.display_name(), "b@x");
    }

    #[test]
    fn test_creator_display_name() {
        let named = TaskCreator::User(CreatorInfo {
            id: "u1".into(),
            username: Some("bob".into()),
            email: Some("bob@x".into()),
        });
        assert_eq!(named.display_name(), "bob");

        let bare_object = TaskCreator::User(CreatorInfo {
            id: "u2".into(),
            ..Default::default()
        });
        assert_eq!(bare_object.display_name(), "u2");
        assert_eq!(TaskCreator::Id("u3".into()).display_name(), "u3");
    }

    #[test]
    fn test_task_null_fields_use_defaults() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "_id": "1",
            "title": "t",
            "priority": null,
            "status": null,
            "description": null,
            "dueDate": null,
            "assignedTo": null
        }))
        .unwrap();
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.description, "");
        assert!(task.due_date.is_none());
        assert!(task.assigned_to.is_none());
    }

    #[test]
    fn test_priority_and_status_parse_case_insensitive() {
        assert_eq!("HIGH".parse::<TaskPriority>().unwrap(), TaskPriority::High);
        assert_eq!(
            "In Progress".parse::<TaskStatus>().unwrap(),
            TaskStatus::InProgress
        );
        assert!("urgent".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_new_task_serializes_camel_case() {
        let task = NewTask {
            title: "t".into(),
            description: "d".into(),
            due_date: Utc::now(),
            priority: TaskPriority::Low,
            status: TaskStatus::InProgress,
            assigned_to: "alice".into(),
            created_by: "u1".into(),
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["assignedTo"], "alice");
        assert_eq!(json["createdBy"], "u1");
        assert_eq!(json["status"], "in progress");
        assert_eq!(json["priority"], "low");
        assert!(json["dueDate"].is_string());
    }
}
