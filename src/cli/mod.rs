//! Command-line interface for homekeep
//!
//! This module defines the CLI structure using clap derive macros.
//! Task commands live in `task`, everything else in `data`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::Result;

mod context;
mod data;
mod task;

pub use context::GlobalOptions;

/// homekeep - household maintenance tasks per place
///
/// Track chores, purchases and repairs for a few fixed places, with
/// recurring tasks and JSON backups.
#[derive(Parser, Debug)]
#[command(name = "homekeep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the state document (defaults to the platform data dir)
    #[arg(long, global = true, env = "HOMEKEEP_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (defaults to <data-dir>/config.toml)
    #[arg(long, global = true, env = "HOMEKEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write change events as JSON lines to a file, or `-` for stdout
    #[arg(long, global = true, value_name = "PATH")]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a task
    Add {
        /// Task title
        title: String,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Change fields of an existing task
    Edit {
        /// Task ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// List tasks for a place
    #[command(visible_alias = "ls")]
    List {
        /// Place ID (defaults to the configured place)
        #[arg(long)]
        place: Option<String>,

        /// Status filter: pending, in-progress, done, all
        #[arg(long)]
        status: Option<String>,

        /// Type filter: repair, buy, restock, improve, all
        #[arg(long = "type", value_name = "TYPE")]
        task_type: Option<String>,

        /// Priority filter: 1-3, low, medium, high, all
        #[arg(long)]
        priority: Option<String>,

        /// Category filter
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive text search over title, notes and category
        #[arg(long)]
        query: Option<String>,
    },

    /// Show one task
    Show {
        /// Task ID
        id: String,
    },

    /// Set a task's status
    Status {
        /// Task ID
        id: String,

        /// New status: pending, in-progress, done
        status: String,
    },

    /// Mark a task done (schedules the next occurrence of recurring tasks)
    Done {
        /// Task ID
        id: String,
    },

    /// Delete a task
    Rm {
        /// Task ID
        id: String,
    },

    /// List places
    Places,

    /// List or add categories
    Categories {
        #[command(subcommand)]
        command: Option<CategoryCommands>,
    },

    /// Add the built-in starter tasks to a place
    Seed {
        /// Place ID (defaults to the configured place)
        #[arg(long)]
        place: Option<String>,
    },

    /// Write a JSON backup of everything
    Export {
        /// Output file or directory (defaults to <prefix>_<date>.json here)
        #[arg(long, conflicts_with = "stdout")]
        out: Option<PathBuf>,

        /// Print the backup to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },

    /// Replace all data with a JSON backup
    Import {
        /// Backup file
        file: PathBuf,
    },
}

/// Category subcommands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Add a category
    Add {
        /// Category name
        name: String,
    },
}

/// Task fields accepted by `add` and `edit`
#[derive(Args, Debug, Clone, Default)]
pub struct TaskFields {
    /// Free-text notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Place ID
    #[arg(long)]
    pub place: Option<String>,

    /// Type: repair, buy, restock, improve
    #[arg(long = "type", value_name = "TYPE")]
    pub task_type: Option<String>,

    /// Category
    #[arg(long)]
    pub category: Option<String>,

    /// Priority 1 (low) to 3 (high)
    #[arg(long)]
    pub priority: Option<String>,

    /// Status: pending, in-progress, done
    #[arg(long)]
    pub status: Option<String>,

    /// Due date (YYYY-MM-DD); empty clears it
    #[arg(long, value_name = "DATE")]
    pub due: Option<String>,

    /// Estimated cost, whole amount
    #[arg(long)]
    pub cost: Option<String>,

    /// Repeat every N days after completion (enables recurrence)
    #[arg(long, value_name = "DAYS")]
    pub every: Option<String>,

    /// Enable recurrence
    #[arg(long, conflicts_with = "no_recurring")]
    pub recurring: bool,

    /// Disable recurrence
    #[arg(long)]
    pub no_recurring: bool,
}

impl From<TaskFields> for task::FieldOptions {
    fn from(fields: TaskFields) -> Self {
        task::FieldOptions {
            notes: fields.notes,
            place: fields.place,
            task_type: fields.task_type,
            category: fields.category,
            priority: fields.priority,
            status: fields.status,
            due: fields.due,
            cost: fields.cost,
            every: fields.every,
            recurring: fields.recurring,
            no_recurring: fields.no_recurring,
        }
    }
}

impl Cli {
    pub fn global(&self) -> GlobalOptions {
        GlobalOptions {
            data_dir: self.data_dir.clone(),
            config: self.config.clone(),
            events: self.events.clone(),
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let global = self.global();
        match self.command {
            Commands::Add { title, fields } => task::run_add(task::AddOptions {
                title,
                fields: fields.into(),
                global,
            }),
            Commands::Edit { id, title, fields } => task::run_edit(task::EditOptions {
                id,
                title,
                fields: fields.into(),
                global,
            }),
            Commands::List {
                place,
                status,
                task_type,
                priority,
                category,
                query,
            } => task::run_list(task::ListOptions {
                place,
                status,
                task_type,
                priority,
                category,
                query,
                global,
            }),
            Commands::Show { id } => task::run_show(task::ShowOptions { id, global }),
            Commands::Status { id, status } => task::run_status(task::StatusOptions {
                id,
                status,
                global,
            }),
            Commands::Done { id } => task::run_done(task::ShowOptions { id, global }),
            Commands::Rm { id } => task::run_delete(task::DeleteOptions { id, global }),
            Commands::Places => data::run_places(global),
            Commands::Categories { command } => match command {
                None => data::run_categories(global),
                Some(CategoryCommands::Add { name }) => {
                    data::run_category_add(data::CategoryAddOptions { name, global })
                }
            },
            Commands::Seed { place } => data::run_seed(data::SeedOptions { place, global }),
            Commands::Export { out, stdout } => data::run_export(data::ExportOptions {
                out,
                stdout,
                global,
            }),
            Commands::Import { file } => data::run_import(data::ImportOptions { file, global }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "homekeep",
            "list",
            "--data-dir",
            "/tmp/hk",
            "--json",
            "--type",
            "repair",
        ])
        .expect("parse");
        assert!(cli.json);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/hk")));
        match cli.command {
            Commands::List { task_type, .. } => assert_eq!(task_type.as_deref(), Some("repair")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn recurring_flags_conflict() {
        let err = Cli::try_parse_from(["homekeep", "add", "x", "--recurring", "--no-recurring"])
            .expect_err("conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
