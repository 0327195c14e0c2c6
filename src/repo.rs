//! Task repository
//!
//! [`TaskRepository`] owns the [`AppState`] for the lifetime of the program.
//! Every mutation is written through to the [`StateStore`] and then announced
//! to subscribers as a [`Change`], so presentation layers re-render from
//! notifications instead of being called by the core.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::filter::{self, Criteria, PlaceSummary};
use crate::model::{AppState, Place, Task, TaskStatus};
use crate::recurrence;
use crate::storage::{LoadOrigin, StateStore};
use crate::templates;

/// A committed mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Change {
    Upserted { id: String, created: bool },
    Deleted { id: String },
    StatusChanged {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
    RecurrenceSpawned { from: String, id: String },
    Replaced { tasks: usize },
    CategoryAdded { name: String },
    Seeded { ids: Vec<String> },
}

/// Result of a status change on an existing task
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutcome {
    pub task: Task,
    pub previous: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successor: Option<Task>,
}

/// Filtered, ordered tasks for one place plus its status counts
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub place_id: String,
    pub place_name: String,
    pub summary: PlaceSummary,
    pub tasks: Vec<Task>,
}

type Listener = Box<dyn FnMut(&Change)>;
type Clock = Box<dyn Fn() -> DateTime<Utc>>;

pub struct TaskRepository {
    state: AppState,
    origin: LoadOrigin,
    store: Box<dyn StateStore>,
    listeners: Vec<Listener>,
    clock: Clock,
}

impl std::fmt::Debug for TaskRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRepository")
            .field("origin", &self.origin)
            .field("tasks", &self.state.tasks.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TaskRepository {
    /// Load state from `store` (creating or recovering it as needed)
    pub fn open(store: impl StateStore + 'static) -> Result<Self> {
        let mut store: Box<dyn StateStore> = Box::new(store);
        let outcome = store.load()?;
        Ok(Self {
            state: outcome.state,
            origin: outcome.origin,
            store,
            listeners: Vec::new(),
            clock: Box::new(Utc::now),
        })
    }

    /// Replace the wall clock, e.g. to pin "today" in tests
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// How the state was obtained at startup
    pub fn load_origin(&self) -> LoadOrigin {
        self.origin
    }

    /// Register a listener called after every committed mutation
    pub fn subscribe(&mut self, listener: impl FnMut(&Change) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn places(&self) -> &[Place] {
        &self.state.places
    }

    pub fn categories(&self) -> &[String] {
        &self.state.categories
    }

    pub fn place_name<'a>(&'a self, place_id: &'a str) -> &'a str {
        self.state.place_name(place_id)
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.state.task(id)
    }

    /// Current filtered view plus summary counts for the criteria's place
    pub fn view(&self, criteria: &Criteria) -> TaskView {
        TaskView {
            place_id: criteria.place_id.clone(),
            place_name: self.place_name(&criteria.place_id).to_string(),
            summary: filter::summarize(&self.state.tasks, &criteria.place_id),
            tasks: filter::visible_tasks(&self.state.tasks, criteria),
        }
    }

    /// Replace the task with the same id, or append it
    pub fn upsert(&mut self, task: Task) -> Result<()> {
        let id = task.id.clone();
        let created = match self.state.tasks.iter_mut().find(|t| t.id == id) {
            Some(existing) => {
                *existing = task;
                false
            }
            None => {
                self.state.tasks.push(task);
                true
            }
        };
        tracing::debug!(task = %id, created, "upserted task");
        self.commit(Change::Upserted { id, created })
    }

    /// Remove a task; unknown ids are a no-op
    pub fn delete(&mut self, id: &str) -> Result<Option<Task>> {
        let Some(index) = self.state.tasks.iter().position(|t| t.id == id) else {
            tracing::debug!(task = %id, "delete ignored; no such task");
            return Ok(None);
        };
        let removed = self.state.tasks.remove(index);
        self.commit(Change::Deleted { id: id.to_string() })?;
        Ok(Some(removed))
    }

    /// Change a task's status; unknown ids are a no-op.
    ///
    /// Completing a recurring task also schedules its next occurrence, after
    /// the status change itself has been persisted.
    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<Option<StatusOutcome>> {
        let now = self.now();
        let Some(task) = self.state.tasks.iter_mut().find(|t| t.id == id) else {
            tracing::debug!(task = %id, "status change ignored; no such task");
            return Ok(None);
        };
        let previous = task.status;
        task.status = status;
        task.updated_at = Some(now);
        let updated = task.clone();

        self.commit(Change::StatusChanged {
            id: id.to_string(),
            from: previous,
            to: status,
        })?;

        let mut successor = None;
        if recurrence::should_spawn(previous, &updated) {
            if let Some(next) = recurrence::plan_successor(&self.state.tasks, &updated, now) {
                let next_id = next.id.clone();
                self.state.tasks.push(next.clone());
                tracing::debug!(task = %id, successor = %next_id, "scheduled next occurrence");
                self.commit(Change::RecurrenceSpawned {
                    from: id.to_string(),
                    id: next_id,
                })?;
                successor = Some(next);
            }
        }

        Ok(Some(StatusOutcome {
            task: updated,
            previous,
            successor,
        }))
    }

    /// Swap in a whole new state (used by import)
    pub fn replace_state(&mut self, state: AppState) -> Result<()> {
        let tasks = state.tasks.len();
        self.state = state;
        self.commit(Change::Replaced { tasks })
    }

    /// Append a category if it is new; returns whether it was added
    pub fn add_category(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() || self.state.categories.iter().any(|c| c == name) {
            return Ok(false);
        }
        self.state.categories.push(name.to_string());
        self.commit(Change::CategoryAdded {
            name: name.to_string(),
        })?;
        Ok(true)
    }

    /// Add the starter templates not already open in `place_id`
    pub fn seed_templates(&mut self, place_id: &str) -> Result<Vec<Task>> {
        let added = templates::missing_templates(&self.state.tasks, place_id, self.now());
        if added.is_empty() {
            return Ok(added);
        }
        self.state.tasks.extend(added.iter().cloned());
        let ids = added.iter().map(|task| task.id.clone()).collect();
        self.commit(Change::Seeded { ids })?;
        Ok(added)
    }

    fn commit(&mut self, change: Change) -> Result<()> {
        self.store.save(&self.state)?;
        for listener in &mut self.listeners {
            listener(&change);
        }
        Ok(())
    }
}
