use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    /// Pending and in-progress tasks are what the daily planner works from.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    /// Owner's username.
    #[serde(default)]
    pub user: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub ai_suggested_priority: TaskPriority,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_active() && self.due_date.map(|due| due < now).unwrap_or(false)
    }

    /// Client-side display order: earliest due date first with undated tasks
    /// last, then higher priority first. The server's own ordering compares
    /// priorities as strings, so lists are re-sorted with this key.
    pub fn sort_key(&self) -> (bool, Option<DateTime<Utc>>, std::cmp::Reverse<TaskPriority>) {
        (
            self.due_date.is_none(),
            self.due_date,
            std::cmp::Reverse(self.ai_suggested_priority),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(id: i64, due: Option<DateTime<Utc>>, priority: TaskPriority) -> Task {
        Task {
            id,
            user: Some("ada".into()),
            title: format!("task {}", id),
            description: String::new(),
            due_date: due,
            status: TaskStatus::Pending,
            ai_suggested_priority: priority,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_parse_task() {
        let json = r#"{"id": 3, "user": "ada", "title": "Write report", "description": "",
            "due_date": "2026-10-20T09:00:00Z", "status": "in_progress",
            "ai_suggested_priority": "high", "created_at": "2026-10-01T08:00:00Z",
            "updated_at": "2026-10-02T08:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).expect("Failed to parse task JSON");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.ai_suggested_priority, TaskPriority::High);
        assert_eq!(task.due_date, Some(Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).unwrap()));
    }

    #[test]
    fn test_overdue_only_for_active_tasks() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let past = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();

        let mut t = task(1, Some(past), TaskPriority::Low);
        assert!(t.is_overdue(now));

        t.status = TaskStatus::Completed;
        assert!(!t.is_overdue(now));

        assert!(!task(2, None, TaskPriority::Low).is_overdue(now));
    }

    #[test]
    fn test_sort_key_orders_by_due_date_then_priority() {
        let early = Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 10, 30, 0, 0, 0).unwrap();
        let mut tasks = vec![
            task(1, None, TaskPriority::Critical),
            task(2, Some(late), TaskPriority::Low),
            task(3, Some(early), TaskPriority::Low),
            task(4, Some(early), TaskPriority::High),
        ];
        tasks.sort_by_key(|t| t.sort_key());
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }
}
