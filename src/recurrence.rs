//! Recurring task generation
//!
//! When a recurring task is completed, a pending copy is scheduled
//! `every_days` after its due date (or after today when it had none).

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::model::{clamp_every_days, new_task_id, Task, TaskStatus};

/// Whether moving `task` out of `previous` should spawn a successor
pub fn should_spawn(previous: TaskStatus, task: &Task) -> bool {
    previous != TaskStatus::Done && task.status == TaskStatus::Done && task.recurring.enabled
}

/// Due date of the next occurrence; `None` if the date would overflow
pub fn next_due_date(task: &Task, today: NaiveDate) -> Option<NaiveDate> {
    let base = task.due_date.unwrap_or(today);
    let days = clamp_every_days(i64::from(task.recurring.every_days));
    base.checked_add_days(Days::new(u64::from(days)))
}

/// Pending copy of `completed` with a fresh id and the next due date
pub fn build_successor(completed: &Task, now: DateTime<Utc>) -> Task {
    Task {
        id: new_task_id(),
        status: TaskStatus::Pending,
        due_date: next_due_date(completed, now.date_naive()),
        created_at: Some(now),
        updated_at: Some(now),
        ..completed.clone()
    }
}

/// An open task already covers the same title, place, type and due date
pub fn is_duplicate(tasks: &[Task], candidate: &Task) -> bool {
    tasks.iter().any(|task| {
        task.status != TaskStatus::Done
            && task.title == candidate.title
            && task.place_id == candidate.place_id
            && task.task_type == candidate.task_type
            && task.due_date == candidate.due_date
    })
}

/// Successor to insert for `completed`, unless an equivalent one is open
pub fn plan_successor(tasks: &[Task], completed: &Task, now: DateTime<Utc>) -> Option<Task> {
    let successor = build_successor(completed, now);
    if is_duplicate(tasks, &successor) {
        tracing::debug!(
            task = %completed.id,
            "recurring successor already scheduled; skipping"
        );
        return None;
    }
    Some(successor)
}
