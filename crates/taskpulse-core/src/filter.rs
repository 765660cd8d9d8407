//! Dashboard task filtering and task form validation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::models::{NewTask, Task, TaskPriority, TaskStatus, User};

/// Dashboard tab selecting which tasks are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskTab {
    #[default]
    All,
    /// Tasks assigned to the current user.
    Assigned,
    /// Tasks created by the current user.
    Created,
    /// Tasks past their due date and not completed.
    Overdue,
}

impl TaskTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskTab::All => "all",
            TaskTab::Assigned => "assigned",
            TaskTab::Created => "created",
            TaskTab::Overdue => "overdue",
        }
    }
}

impl FromStr for TaskTab {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(TaskTab::All),
            "assigned" => Ok(TaskTab::Assigned),
            "created" => Ok(TaskTab::Created),
            "overdue" => Ok(TaskTab::Overdue),
            other => Err(Error::InvalidInput(format!("Unknown tab: {}", other))),
        }
    }
}

impl fmt::Display for TaskTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search, priority and tab filter applied to the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive substring matched against title or description.
    pub search: String,
    /// `None` means all priorities.
    pub priority: Option<TaskPriority>,
    pub tab: TaskTab,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_priority(mut self, priority: Option<TaskPriority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tab(mut self, tab: TaskTab) -> Self {
        self.tab = tab;
        self
    }

    /// Whether `task` should be shown to `user` at time `now`.
    pub fn matches(&self, task: &Task, user: &User, now: DateTime<Utc>) -> bool {
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let hit = task.title.to_lowercase().contains(&needle)
                || task.description.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }

        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }

        match self.tab {
            TaskTab::All => true,
            TaskTab::Assigned => task.assigned_to.as_deref() == Some(user.username.as_str()),
            TaskTab::Created => task
                .created_by
                .as_ref()
                .is_some_and(|creator| !user.id.is_empty() && creator.id() == user.id),
            TaskTab::Overdue => task
                .due_date
                .is_some_and(|due| due < now && task.status != TaskStatus::Completed),
        }
    }

    /// Tasks matching the filter, in their original order.
    pub fn apply<'a>(&self, tasks: &'a [Task], user: &User, now: DateTime<Utc>) -> Vec<&'a Task> {
        tasks
            .iter()
            .filter(|task| self.matches(task, user, now))
            .collect()
    }
}

/// Message shown when a required form field is empty.
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill out all required fields";

/// Message shown when the logged-in user has no id.
pub const INCOMPLETE_USER_MESSAGE: &str =
    "Your user information is incomplete. Please log out and log back in.";

/// Raw task form input as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    /// RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
    pub due_date: String,
    pub priority: String,
    pub status: String,
    /// Username of the assignee.
    pub assigned_to: String,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            due_date: String::new(),
            priority: TaskPriority::default().to_string(),
            status: TaskStatus::default().to_string(),
            assigned_to: String::new(),
        }
    }
}

impl TaskForm {
    /// Pre-fill the form from an existing task for editing.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            priority: task.priority.to_string(),
            status: task.status.to_string(),
            assigned_to: task.assigned_to.clone().unwrap_or_default(),
        }
    }

    /// Validate the form into a request body created by `user`.
    pub fn validate(&self, user: Option<&User>) -> Result<NewTask> {
        let required = [
            &self.title,
            &self.description,
            &self.due_date,
            &self.assigned_to,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(Error::InvalidInput(MISSING_FIELDS_MESSAGE.to_string()));
        }

        let user = user.ok_or_else(|| Error::InvalidInput(MISSING_FIELDS_MESSAGE.to_string()))?;
        if user.id.trim().is_empty() {
            return Err(Error::InvalidInput(INCOMPLETE_USER_MESSAGE.to_string()));
        }

        Ok(NewTask {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            due_date: parse_due_date(&self.due_date)?,
            priority: self.priority.parse()?,
            status: self.status.parse()?,
            assigned_to: self.assigned_to.trim().to_string(),
            created_by: user.id.clone(),
        })
    }
}

fn parse_due_date(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::InvalidInput(format!("Invalid due date: {}", input)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskCreator;
    use chrono::{Duration, TimeZone};

    fn alice() -> User {
        User {
            id: "u-alice".to_string(),
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
        }
    }

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            due_date: None,
            priority: TaskPriority::Medium,
            status: TaskStatus::Todo,
            assigned_to: None,
            created_by: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let mut a = task("1", "Write Docs");
        a.description = "first draft".to_string();
        let mut b = task("2", "Review");
        b.description = "Check the DOCS wording".to_string();
        let c = task("3", "Deploy");
        let tasks = vec![a, b, c];

        let filter = TaskFilter::new().with_search("docs");
        let ids: Vec<&str> = filter
            .apply(&tasks, &alice(), now())
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_priority_filter() {
        let mut high = task("1", "a");
        high.priority = TaskPriority::High;
        let low = task("2", "b");
        let tasks = vec![high, low];

        let filter = TaskFilter::new().with_priority(Some(TaskPriority::High));
        assert_eq!(filter.apply(&tasks, &alice(), now()).len(), 1);
        assert_eq!(TaskFilter::new().apply(&tasks, &alice(), now()).len(), 2);
    }

    #[test]
    fn test_assigned_and_created_tabs() {
        let mut mine = task("1", "mine");
        mine.assigned_to = Some("alice".to_string());
        let mut created = task("2", "created");
        created.assigned_to = Some("bob".to_string());
        created.created_by = Some(TaskCreator::User(alice().into()));
        let mut other = task("3", "other");
        other.created_by = Some(TaskCreator::Id("u-bob".to_string()));
        let tasks = vec![mine, created, other];

        let assigned = TaskFilter::new().with_tab(TaskTab::Assigned);
        let ids: Vec<&str> = assigned
            .apply(&tasks, &alice(), now())
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1"]);

        let created_tab = TaskFilter::new().with_tab(TaskTab::Created);
        let ids: Vec<&str> = created_tab
            .apply(&tasks, &alice(), now())
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn test_overdue_tab_skips_completed_and_undated() {
        let mut late = task("1", "late");
        late.due_date = Some(now() - Duration::days(1));
        let mut late_done = task("2", "late but done");
        late_done.due_date = Some(now() - Duration::days(1));
        late_done.status = TaskStatus::Completed;
        let mut future = task("3", "future");
        future.due_date = Some(now() + Duration::days(1));
        let undated = task("4", "undated");
        let tasks = vec![late, late_done, future, undated];

        let filter = TaskFilter::new().with_tab(TaskTab::Overdue);
        let ids: Vec<&str> = filter
            .apply(&tasks, &alice(), now())
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_tab_parse() {
        assert_eq!("Overdue".parse::<TaskTab>().unwrap(), TaskTab::Overdue);
        assert!("archived".parse::<TaskTab>().is_err());
    }

    fn filled_form() -> TaskForm {
        TaskForm {
            title: "Write docs".to_string(),
            description: "All of it".to_string(),
            due_date: "2026-11-01".to_string(),
            priority: "High".to_string(),
            status: "In Progress".to_string(),
            assigned_to: "bob".to_string(),
        }
    }

    #[test]
    fn test_validate_ok() {
        let new_task = filled_form().validate(Some(&alice())).unwrap();
        assert_eq!(new_task.priority, TaskPriority::High);
        assert_eq!(new_task.status, TaskStatus::InProgress);
        assert_eq!(new_task.created_by, "u-alice");
        assert_eq!(
            new_task.due_date,
            Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_validate_rfc3339_due_date() {
        let mut form = filled_form();
        form.due_date = "2026-11-01T09:30:00+02:00".to_string();
        let new_task = form.validate(Some(&alice())).unwrap();
        assert_eq!(
            new_task.due_date,
            Utc.with_ymd_and_hms(2026, 11, 1, 7, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_validate_missing_fields() {
        let mut form = filled_form();
        form.assigned_to = "  ".to_string();
        let err = form.validate(Some(&alice())).unwrap_err();
        assert_eq!(err.to_string(), format!("Invalid input: {}", MISSING_FIELDS_MESSAGE));

        assert!(filled_form().validate(None).is_err());
    }

    #[test]
    fn test_validate_incomplete_user() {
        let mut user = alice();
        user.id.clear();
        let err = filled_form().validate(Some(&user)).unwrap_err();
        assert!(err.to_string().contains(INCOMPLETE_USER_MESSAGE));
    }

    #[test]
    fn test_validate_bad_due_date() {
        let mut form = filled_form();
        form.due_date = "next tuesday".to_string();
        assert!(matches!(
            form.validate(Some(&alice())),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_form_from_task_round_trips_through_validate() {
        let mut existing = task("1", "Edit me");
        existing.description = "desc".to_string();
        existing.assigned_to = Some("bob".to_string());
        existing.due_date = Some(Utc.with_ymd_and_hms(2026, 12, 24, 0, 0, 0).unwrap());
        existing.status = TaskStatus::Completed;

        let form = TaskForm::from_task(&existing);
        assert_eq!(form.due_date, "2026-12-24");
        let new_task = form.validate(Some(&alice())).unwrap();
        assert_eq!(new_task.status, TaskStatus::Completed);
        assert_eq!(new_task.due_date, existing.due_date.unwrap());
    }
}
