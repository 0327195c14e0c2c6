//! Task filtering, ordering and per-place summaries
//!
//! Everything here is pure: callers pass the task slice in and get owned
//! results back.

use std::cmp::Ordering;

use serde::Serialize;

use crate::model::{Priority, Task, TaskStatus, TaskType};

/// Active filter selections. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub place_id: String,
    pub status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub query: String,
}

impl Criteria {
    /// Everything in one place
    pub fn for_place(place_id: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            ..Self::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        if task.place_id != self.place_id {
            return false;
        }
        if self.status.is_some_and(|status| task.status != status) {
            return false;
        }
        if self.task_type.is_some_and(|kind| task.task_type != kind) {
            return false;
        }
        if self.priority.is_some_and(|priority| task.priority != priority) {
            return false;
        }
        if let Some(category) = self.category.as_deref() {
            if task.effective_category() != category {
                return false;
            }
        }

        let query = self.query.trim().to_lowercase();
        if !query.is_empty() {
            let haystack =
                format!("{} {} {}", task.title, task.notes, task.category).to_lowercase();
            if !haystack.contains(&query) {
                return false;
            }
        }

        true
    }
}

/// Open work first, then urgency, then most recently touched.
///
/// Ties fall through to the id so the order is total.
pub fn compare_tasks(left: &Task, right: &Task) -> Ordering {
    left.status
        .rank()
        .cmp(&right.status.rank())
        .then_with(|| right.priority.cmp(&left.priority))
        .then_with(|| right.touched_at().cmp(&left.touched_at()))
        .then_with(|| left.id.cmp(&right.id))
}

/// Tasks matching `criteria`, in display order
pub fn visible_tasks(tasks: &[Task], criteria: &Criteria) -> Vec<Task> {
    let mut visible: Vec<Task> = tasks
        .iter()
        .filter(|task| criteria.matches(task))
        .cloned()
        .collect();
    visible.sort_by(compare_tasks);
    visible
}

/// Status counts for one place, ignoring every other criterion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlaceSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
}

pub fn summarize(tasks: &[Task], place_id: &str) -> PlaceSummary {
    tasks
        .iter()
        .filter(|task| task.place_id == place_id)
        .fold(PlaceSummary::default(), |mut summary, task| {
            summary.total += 1;
            match task.status {
                TaskStatus::Pending => summary.pending += 1,
                TaskStatus::InProgress => summary.in_progress += 1,
                TaskStatus::Done => summary.done += 1,
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn task(title: &str, status: TaskStatus, priority: Priority, minutes: i64) -> Task {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let mut task = Task::new(title, "musicala", base);
        task.status = status;
        task.priority = priority;
        task.updated_at = Some(base + Duration::minutes(minutes));
        task
    }

    #[test]
    fn done_tasks_hidden_by_other_status_filters() {
        let tasks = vec![
            task("a", TaskStatus::Done, Priority::High, 0),
            task("b", TaskStatus::Pending, Priority::Low, 0),
        ];
        let mut criteria = Criteria::for_place("musicala");
        criteria.status = Some(TaskStatus::Pending);

        let visible = visible_tasks(&tasks, &criteria);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "b");

        criteria.status = Some(TaskStatus::InProgress);
        assert!(visible_tasks(&tasks, &criteria).is_empty());
    }

    #[test]
    fn query_is_case_insensitive_across_fields() {
        let mut with_notes = task("Grifo", TaskStatus::Pending, Priority::Medium, 0);
        with_notes.notes = "Gotea en el BAÑO".to_string();
        let tasks = vec![
            task("Comprar Papel Higiénico", TaskStatus::Pending, Priority::Medium, 0),
            with_notes,
        ];

        let mut criteria = Criteria::for_place("musicala");
        criteria.query = "  papel ".to_string();
        assert_eq!(visible_tasks(&tasks, &criteria).len(), 1);

        criteria.query = "baño".to_string();
        assert_eq!(visible_tasks(&tasks, &criteria)[0].title, "Grifo");

        criteria.query = "general".to_string();
        assert_eq!(visible_tasks(&tasks, &criteria).len(), 2);
    }

    #[test]
    fn blank_category_matches_general() {
        let mut blank = task("x", TaskStatus::Pending, Priority::Medium, 0);
        blank.category = String::new();
        let mut criteria = Criteria::for_place("musicala");
        criteria.category = Some("General".to_string());
        assert!(criteria.matches(&blank));

        criteria.category = Some("Cocina".to_string());
        assert!(!criteria.matches(&blank));
    }

    #[test]
    fn other_places_are_excluded() {
        let mut elsewhere = task("x", TaskStatus::Pending, Priority::Medium, 0);
        elsewhere.place_id = "casa_alek".to_string();
        assert!(!Criteria::for_place("musicala").matches(&elsewhere));
    }

    #[test]
    fn ordering_is_status_then_priority_then_recency() {
        let tasks = vec![
            task("done-high", TaskStatus::Done, Priority::High, 50),
            task("pending-low-new", TaskStatus::Pending, Priority::Low, 40),
            task("doing-high", TaskStatus::InProgress, Priority::High, 10),
            task("pending-high-old", TaskStatus::Pending, Priority::High, 1),
            task("pending-high-new", TaskStatus::Pending, Priority::High, 30),
        ];

        let visible = visible_tasks(&tasks, &Criteria::for_place("musicala"));
        let titles: Vec<&str> = visible.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "pending-high-new",
                "pending-high-old",
                "pending-low-new",
                "doing-high",
                "done-high",
            ]
        );

        for pair in visible.windows(2) {
            assert_ne!(compare_tasks(&pair[0], &pair[1]), Ordering::Greater);
        }
        assert_eq!(visible, visible_tasks(&tasks, &Criteria::for_place("musicala")));
    }

    #[test]
    fn missing_timestamps_sort_as_oldest() {
        let mut untouched = task("untouched", TaskStatus::Pending, Priority::Medium, 0);
        untouched.updated_at = None;
        untouched.created_at = None;
        let mut created_only = task("created", TaskStatus::Pending, Priority::Medium, 0);
        created_only.updated_at = None;

        let visible = visible_tasks(
            &[untouched, created_only],
            &Criteria::for_place("musicala"),
        );
        assert_eq!(visible[0].title, "created");
        assert_eq!(visible[1].title, "untouched");
    }

    #[test]
    fn summary_counts_every_status_for_the_place() {
        let mut elsewhere = task("x", TaskStatus::Pending, Priority::Medium, 0);
        elsewhere.place_id = "nuestro".to_string();
        let tasks = vec![
            task("a", TaskStatus::Pending, Priority::Medium, 0),
            task("b", TaskStatus::InProgress, Priority::Medium, 0),
            task("c", TaskStatus::Done, Priority::Medium, 0),
            task("d", TaskStatus::Done, Priority::Medium, 0),
            elsewhere,
        ];

        assert_eq!(
            summarize(&tasks, "musicala"),
            PlaceSummary {
                total: 4,
                pending: 1,
                in_progress: 1,
                done: 2,
            }
        );
    }
}
