//! homekeep task command implementations.

use serde::Serialize;

use crate::cli::context::{load_context, parse_arg, parse_filter, CommandContext, GlobalOptions};
use crate::draft::TaskDraft;
use crate::error::{Error, Result};
use crate::filter::{Criteria, PlaceSummary};
use crate::model::{Priority, Task, TaskStatus, TaskType};
use crate::output::{emit_success, HumanOutput};
use crate::repo::StatusOutcome;

/// Optional task fields shared by `add` and `edit`
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    pub notes: Option<String>,
    pub place: Option<String>,
    pub task_type: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due: Option<String>,
    pub cost: Option<String>,
    pub every: Option<String>,
    pub recurring: bool,
    pub no_recurring: bool,
}

pub struct AddOptions {
    pub title: String,
    pub fields: FieldOptions,
    pub global: GlobalOptions,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub fields: FieldOptions,
    pub global: GlobalOptions,
}

pub struct ListOptions {
    pub place: Option<String>,
    pub status: Option<String>,
    pub task_type: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub query: Option<String>,
    pub global: GlobalOptions,
}

pub struct ShowOptions {
    pub id: String,
    pub global: GlobalOptions,
}

pub struct StatusOptions {
    pub id: String,
    pub status: String,
    pub global: GlobalOptions,
}

pub struct DeleteOptions {
    pub id: String,
    pub global: GlobalOptions,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;
    let draft = build_draft(Some(options.title), options.fields)?;

    let task = draft.build(None, &ctx.draft_defaults(), ctx.repo.now())?;
    ctx.require_place(&task.place_id)?;
    ctx.repo.upsert(task.clone())?;

    let mut human = ctx.human("Task created");
    push_task_summary(&mut human, &ctx, &task);
    human.push_next_step(format!("homekeep done {}", task.id));

    emit_success(ctx.output(), "add", &task, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;
    let existing = require_task(&ctx, &options.id)?;
    let draft = build_draft(options.title, options.fields)?;
    if let Some(place) = draft.place_id.as_deref() {
        ctx.require_place(place.trim())?;
    }

    let task = draft.build(Some(&existing), &ctx.draft_defaults(), ctx.repo.now())?;
    ctx.repo.upsert(task.clone())?;

    let mut human = ctx.human("Task updated");
    push_task_summary(&mut human, &ctx, &task);

    emit_success(ctx.output(), "edit", &task, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let place_id = options
        .place
        .map(|place| place.trim().to_string())
        .unwrap_or_else(|| ctx.default_place());

    let criteria = Criteria {
        place_id,
        status: parse_filter::<TaskStatus>(options.status.as_deref())?,
        task_type: parse_filter::<TaskType>(options.task_type.as_deref())?,
        priority: parse_filter::<Priority>(options.priority.as_deref())?,
        category: options
            .category
            .map(|category| category.trim().to_string())
            .filter(|category| !category.is_empty() && !category.eq_ignore_ascii_case("all")),
        query: options.query.unwrap_or_default(),
    };
    let view = ctx.repo.view(&criteria);

    let mut human = ctx.human(format!("Tasks in {}", view.place_name));
    if !ctx.repo.state().has_place(&view.place_id) {
        human.push_warning(format!("'{}' is not a known place", view.place_id));
    }
    human.push_summary("Showing", view.tasks.len().to_string());
    push_place_summary(&mut human, &view.summary);
    for task in &view.tasks {
        human.push_detail(task_line(task));
    }
    if view.tasks.is_empty() {
        human.push_next_step("homekeep add <title>");
    }

    emit_success(ctx.output(), "list", &view, Some(&human))
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let task = require_task(&ctx, &options.id)?;

    let mut human = ctx.human(format!("Task {}", task.id));
    push_task_summary(&mut human, &ctx, &task);

    emit_success(ctx.output(), "show", &task, Some(&human))
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let status = parse_arg::<TaskStatus>(Some(options.status.as_str()))?.unwrap_or_default();
    change_status(&options.id, status, &options.global, "status")
}

pub fn run_done(options: ShowOptions) -> Result<()> {
    change_status(&options.id, TaskStatus::Done, &options.global, "done")
}

fn change_status(
    id: &str,
    status: TaskStatus,
    global: &GlobalOptions,
    command: &str,
) -> Result<()> {
    let mut ctx = load_context(global)?;
    let outcome = ctx.repo.set_status(id, status)?;

    let human = match outcome.as_ref() {
        Some(outcome) => {
            let header = if outcome.task.is_done() {
                "Task completed"
            } else {
                "Task status updated"
            };
            let mut human = ctx.human(header);
            push_status_summary(&mut human, outcome);
            human
        }
        None => {
            let mut human = ctx.human("Nothing changed");
            human.push_summary("ID", id.to_string());
            human.push_warning(format!("no task with id {id}"));
            human.push_next_step("homekeep list");
            human
        }
    };

    let output = StatusOutput {
        id: id.to_string(),
        changed: outcome.is_some(),
        outcome,
    };
    emit_success(ctx.output(), command, &output, Some(&human))
}

#[derive(Serialize)]
struct StatusOutput {
    id: String,
    changed: bool,
    #[serde(flatten)]
    outcome: Option<StatusOutcome>,
}

pub fn run_delete(options: DeleteOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;
    let removed = ctx.repo.delete(&options.id)?;

    let output = DeleteOutput {
        id: options.id.clone(),
        deleted: removed.is_some(),
    };

    let mut human = match removed.as_ref() {
        Some(task) => {
            let mut human = ctx.human("Task deleted");
            human.push_summary("Title", task.title.clone());
            human
        }
        None => {
            let mut human = ctx.human("Nothing deleted");
            human.push_warning(format!("no task with id {}", options.id));
            human
        }
    };
    human.push_summary("ID", options.id);

    emit_success(ctx.output(), "rm", &output, Some(&human))
}

#[derive(Serialize)]
struct DeleteOutput {
    id: String,
    deleted: bool,
}

fn require_task(ctx: &CommandContext, id: &str) -> Result<Task> {
    ctx.repo
        .get(id)
        .cloned()
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))
}

fn build_draft(title: Option<String>, fields: FieldOptions) -> Result<TaskDraft> {
    let recurring = if fields.no_recurring {
        Some(false)
    } else if fields.recurring || fields.every.is_some() {
        Some(true)
    } else {
        None
    };

    Ok(TaskDraft {
        title,
        notes: fields.notes,
        place_id: fields.place,
        task_type: parse_arg::<TaskType>(fields.task_type.as_deref())?,
        category: fields.category,
        priority: fields.priority,
        status: parse_arg::<TaskStatus>(fields.status.as_deref())?,
        due_date: fields.due,
        cost: fields.cost,
        recurring,
        every_days: fields.every,
    })
}

fn task_line(task: &Task) -> String {
    let mut line = format!(
        "[{}][{}] {} {}",
        task.status, task.priority, task.id, task.title
    );
    let mut extras = vec![task.task_type.to_string(), task.effective_category().to_string()];
    if let Some(due) = task.due_date {
        extras.push(format!("due {due}"));
    }
    if task.recurring.enabled {
        extras.push(format!("every {}d", task.recurring.every_days));
    }
    line.push_str(&format!(" ({})", extras.join(", ")));
    line
}

fn push_place_summary(human: &mut HumanOutput, summary: &PlaceSummary) {
    human.push_summary(
        "Place totals",
        format!(
            "{} total, {} pending, {} in progress, {} done",
            summary.total, summary.pending, summary.in_progress, summary.done
        ),
    );
}

fn push_task_summary(human: &mut HumanOutput, ctx: &CommandContext, task: &Task) {
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Place", ctx.repo.place_name(&task.place_id).to_string());
    human.push_summary("Type", task.task_type.to_string());
    human.push_summary("Category", task.effective_category().to_string());
    human.push_summary("Priority", task.priority.to_string());
    human.push_summary("Status", task.status.to_string());
    if let Some(due) = task.due_date {
        human.push_summary("Due", due.to_string());
    }
    if let Some(cost) = task.cost {
        human.push_summary("Cost", cost.to_string());
    }
    let recurring = if task.recurring.enabled {
        format!("every {} days", task.recurring.every_days)
    } else {
        "off".to_string()
    };
    human.push_summary("Recurring", recurring);
    if !task.notes.is_empty() {
        human.push_detail(task.notes.clone());
    }
}

fn push_status_summary(human: &mut HumanOutput, outcome: &StatusOutcome) {
    human.push_summary("ID", outcome.task.id.clone());
    human.push_summary(
        "Status",
        format!("{} -> {}", outcome.previous, outcome.task.status),
    );
    if let Some(next) = outcome.successor.as_ref() {
        human.push_summary("Next occurrence", next.id.clone());
        let due = next
            .due_date
            .map(|due| due.to_string())
            .unwrap_or_else(|| "none".to_string());
        human.push_summary("Next due", due);
    }
}
