//! Mapping from raw user input to a [`Task`]
//!
//! A [`TaskDraft`] carries whatever the user supplied, as text where the
//! input is free-form. [`TaskDraft::build`] applies it over an existing task
//! (edit) or over the configured defaults (new task).

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{
    clamp_every_days, parse_date, parse_leading_int, sanitize_cost, Priority, Recurrence, Task,
    TaskStatus, TaskType, DEFAULT_CATEGORY, DEFAULT_EVERY_DAYS,
};

/// Values used for fields a new task does not specify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftDefaults {
    pub place_id: String,
    pub category: String,
    pub priority: Priority,
    pub every_days: u16,
}

impl Default for DraftDefaults {
    fn default() -> Self {
        Self {
            place_id: "musicala".to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            priority: Priority::default(),
            every_days: DEFAULT_EVERY_DAYS,
        }
    }
}

/// User-supplied task fields; `None` leaves the field as it is
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub place_id: Option<String>,
    pub task_type: Option<TaskType>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<String>,
    pub cost: Option<String>,
    pub recurring: Option<bool>,
    pub every_days: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Produce the task to upsert.
    ///
    /// Fails on an empty title or an unreadable due date; numeric fields are
    /// clamped or sanitized instead.
    pub fn build(
        self,
        base: Option<&Task>,
        defaults: &DraftDefaults,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let mut task = match base {
            Some(existing) => existing.clone(),
            None => {
                let mut task = Task::new(String::new(), defaults.place_id.clone(), now);
                task.category = defaults.category.clone();
                task.priority = defaults.priority;
                task.recurring = Recurrence::disabled(i64::from(defaults.every_days));
                task
            }
        };

        if let Some(title) = self.title {
            task.title = title.trim().to_string();
        }
        if task.title.is_empty() {
            return Err(Error::InvalidArgument("title cannot be empty".to_string()));
        }

        if let Some(notes) = self.notes {
            task.notes = notes.trim().to_string();
        }
        if let Some(place_id) = self.place_id {
            let place_id = place_id.trim();
            if place_id.is_empty() {
                return Err(Error::InvalidArgument("place cannot be empty".to_string()));
            }
            task.place_id = place_id.to_string();
        }
        if let Some(task_type) = self.task_type {
            task.task_type = task_type;
        }
        if let Some(category) = self.category {
            let category = category.trim();
            task.category = if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category.to_string()
            };
        }
        if let Some(priority) = self.priority {
            task.priority = Priority::coerce(&priority);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due) = self.due_date {
            let due = due.trim();
            task.due_date = if due.is_empty() {
                None
            } else {
                let parsed = parse_date(due).ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "invalid due date '{due}' (expected YYYY-MM-DD)"
                    ))
                })?;
                Some(parsed)
            };
        }
        if let Some(cost) = self.cost {
            task.cost = sanitize_cost(&cost);
        }
        if let Some(enabled) = self.recurring {
            task.recurring.enabled = enabled;
        }
        if let Some(every) = self.every_days {
            task.recurring.every_days = parse_leading_int(&every)
                .map(clamp_every_days)
                .unwrap_or(DEFAULT_EVERY_DAYS);
        }

        task.updated_at = Some(now);
        if task.created_at.is_none() {
            task.created_at = Some(now);
        }
        Ok(task)
    }
}
