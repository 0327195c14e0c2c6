//! Places, categories, templates and backup commands.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::cli::context::{load_context, GlobalOptions};
use crate::error::{Error, Result};
use crate::model::{Place, Task};
use crate::output::emit_success;
use crate::transfer;

pub struct CategoryAddOptions {
    pub name: String,
    pub global: GlobalOptions,
}

pub struct SeedOptions {
    pub place: Option<String>,
    pub global: GlobalOptions,
}

pub struct ExportOptions {
    pub out: Option<PathBuf>,
    pub stdout: bool,
    pub global: GlobalOptions,
}

pub struct ImportOptions {
    pub file: PathBuf,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct PlaceEntry<'a> {
    #[serde(flatten)]
    place: &'a Place,
    total: usize,
    open: usize,
}

pub fn run_places(global: GlobalOptions) -> Result<()> {
    let ctx = load_context(&global)?;
    let default_place = ctx.default_place();

    let entries: Vec<PlaceEntry<'_>> = ctx
        .repo
        .places()
        .iter()
        .map(|place| {
            let summary = crate::filter::summarize(ctx.repo.tasks(), &place.id);
            PlaceEntry {
                place,
                total: summary.total,
                open: summary.pending + summary.in_progress,
            }
        })
        .collect();

    let mut human = ctx.human("Places");
    human.push_summary("Total", entries.len().to_string());
    for entry in &entries {
        let marker = if entry.place.id == default_place {
            " (default)"
        } else {
            ""
        };
        human.push_detail(format!(
            "{} - {}{marker}: {} open / {} total",
            entry.place.id, entry.place.name, entry.open, entry.total
        ));
    }

    emit_success(ctx.output(), "places", &entries, Some(&human))
}

pub fn run_categories(global: GlobalOptions) -> Result<()> {
    let ctx = load_context(&global)?;
    let categories = ctx.repo.categories();

    let mut human = ctx.human("Categories");
    human.push_summary("Total", categories.len().to_string());
    for category in categories {
        human.push_detail(category.clone());
    }

    emit_success(ctx.output(), "categories", &categories, Some(&human))
}

#[derive(Serialize)]
struct CategoryAddOutput {
    name: String,
    added: bool,
}

pub fn run_category_add(options: CategoryAddOptions) -> Result<()> {
    let name = options.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidArgument(
            "category name cannot be empty".to_string(),
        ));
    }

    let mut ctx = load_context(&options.global)?;
    let added = ctx.repo.add_category(&name)?;

    let mut human = if added {
        ctx.human("Category added")
    } else {
        let mut human = ctx.human("Category already exists");
        human.push_warning(format!("'{name}' is already a category"));
        human
    };
    human.push_summary("Name", name.clone());

    emit_success(
        ctx.output(),
        "categories add",
        &CategoryAddOutput { name, added },
        Some(&human),
    )
}

#[derive(Serialize)]
struct SeedOutput {
    place_id: String,
    added: Vec<Task>,
}

pub fn run_seed(options: SeedOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;
    let place_id = options
        .place
        .map(|place| place.trim().to_string())
        .unwrap_or_else(|| ctx.default_place());
    ctx.require_place(&place_id)?;

    let added = ctx.repo.seed_templates(&place_id)?;

    let mut human = ctx.human(format!("Templates for {}", ctx.repo.place_name(&place_id)));
    human.push_summary("Added", added.len().to_string());
    for task in &added {
        human.push_detail(format!("{} {}", task.id, task.title));
    }
    if added.is_empty() {
        human.push_warning("every template is already open in this place".to_string());
    }

    emit_success(
        ctx.output(),
        "seed",
        &SeedOutput { place_id, added },
        Some(&human),
    )
}

#[derive(Serialize)]
struct ExportOutput {
    path: String,
    tasks: usize,
    bytes: usize,
}

pub fn run_export(options: ExportOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let document = transfer::export_document(ctx.repo.state())?;

    if options.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&document)?;
        stdout.flush()?;
        return Ok(());
    }

    let file_name =
        transfer::export_file_name(&ctx.config.export.prefix, ctx.repo.now().date_naive());
    let path = match options.out {
        Some(out) if out.is_dir() => out.join(file_name),
        Some(out) => out,
        None => PathBuf::from(file_name),
    };
    std::fs::write(&path, &document)?;
    tracing::debug!(path = %path.display(), bytes = document.len(), "exported backup");

    let output = ExportOutput {
        path: path.display().to_string(),
        tasks: ctx.repo.tasks().len(),
        bytes: document.len(),
    };

    let mut human = ctx.human("Backup exported");
    human.push_summary("File", output.path.clone());
    human.push_summary("Tasks", output.tasks.to_string());
    human.push_next_step(format!("homekeep import {}", output.path));

    emit_success(ctx.output(), "export", &output, Some(&human))
}

#[derive(Serialize)]
struct ImportOutput {
    tasks: usize,
    places: usize,
    categories: usize,
    replaced_tasks: usize,
}

pub fn run_import(options: ImportOptions) -> Result<()> {
    let raw = std::fs::read(&options.file)?;
    let mut ctx = load_context(&options.global)?;

    let state = transfer::import_document(&raw, ctx.repo.state())?;
    let replaced_tasks = ctx.repo.tasks().len();
    let output = ImportOutput {
        tasks: state.tasks.len(),
        places: state.places.len(),
        categories: state.categories.len(),
        replaced_tasks,
    };
    ctx.repo.replace_state(state)?;

    let mut human = ctx.human("Backup imported");
    human.push_summary("File", options.file.display().to_string());
    human.push_summary("Tasks", output.tasks.to_string());
    human.push_summary("Places", output.places.to_string());
    human.push_summary("Categories", output.categories.to_string());
    if replaced_tasks > 0 {
        human.push_warning(format!("replaced {replaced_tasks} existing task(s)"));
    }

    emit_success(ctx.output(), "import", &output, Some(&human))
}
