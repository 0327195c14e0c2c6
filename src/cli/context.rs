//! Per-invocation setup shared by every command.

use std::path::PathBuf;
use std::str::FromStr;

use crate::config::Config;
use crate::draft::DraftDefaults;
use crate::error::{Error, Result};
use crate::events::EventDestination;
use crate::output::{HumanOutput, OutputOptions};
use crate::repo::TaskRepository;
use crate::storage::{LoadOrigin, Storage};

/// Flags accepted by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub data_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl GlobalOptions {
    pub fn events_to_stdout(&self) -> bool {
        EventDestination::parse(self.events.as_deref()) == Some(EventDestination::Stdout)
    }

    /// JSON events on stdout take precedence over command output
    pub fn output(&self) -> OutputOptions {
        let events_to_stdout = self.events_to_stdout();
        OutputOptions {
            json: self.json && !events_to_stdout,
            quiet: self.quiet || events_to_stdout,
        }
    }
}

pub(crate) struct CommandContext {
    pub repo: TaskRepository,
    pub config: Config,
    pub warnings: Vec<String>,
    output: OutputOptions,
}

/// Resolve the data directory and config, open the repository, and attach
/// the event sink if one was requested.
pub(crate) fn load_context(global: &GlobalOptions) -> Result<CommandContext> {
    let storage = Storage::resolve(global.data_dir.clone())?;
    let config = match global.config.as_deref() {
        Some(path) => Config::load(path)?,
        None => Config::load_from_dir(storage.data_dir()),
    };

    let mut repo = TaskRepository::open(storage.file_store())?;
    let mut warnings = Vec::new();
    if repo.load_origin() == LoadOrigin::RecoveredFromCorruption {
        warnings.push(format!(
            "stored data in {} was unreadable; started over from defaults",
            storage.state_file().display()
        ));
    }

    if let Some(destination) = EventDestination::parse(global.events.as_deref()) {
        let mut sink = destination.open()?;
        repo.subscribe(move |change| sink.emit_change(change));
    }

    Ok(CommandContext {
        repo,
        config,
        warnings,
        output: global.output(),
    })
}

impl CommandContext {
    pub fn output(&self) -> OutputOptions {
        self.output
    }

    /// Human output pre-filled with startup warnings
    pub fn human(&self, header: impl Into<String>) -> HumanOutput {
        let mut human = HumanOutput::new(header);
        for warning in &self.warnings {
            human.push_warning(warning.clone());
        }
        human
    }

    /// Configured default place, else the first known place
    pub fn default_place(&self) -> String {
        self.config
            .defaults
            .place
            .clone()
            .or_else(|| self.repo.places().first().map(|place| place.id.clone()))
            .unwrap_or_default()
    }

    pub fn draft_defaults(&self) -> DraftDefaults {
        DraftDefaults {
            place_id: self.default_place(),
            category: self.config.defaults.category.clone(),
            priority: self.config.defaults.priority(),
            every_days: self.config.defaults.every_days,
        }
    }

    pub fn require_place(&self, place_id: &str) -> Result<()> {
        if self.repo.state().has_place(place_id) {
            return Ok(());
        }
        let known: Vec<&str> = self
            .repo
            .places()
            .iter()
            .map(|place| place.id.as_str())
            .collect();
        Err(Error::InvalidArgument(format!(
            "unknown place '{place_id}' (known: {})",
            known.join(", ")
        )))
    }
}

/// Parse an optional flag value with the type's `FromStr`
pub(crate) fn parse_arg<T>(value: Option<&str>) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    value
        .map(|raw| raw.parse::<T>().map_err(Error::InvalidArgument))
        .transpose()
}

/// Like [`parse_arg`], with `all` meaning no filter
pub(crate) fn parse_filter<T>(value: Option<&str>) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    match value.map(str::trim) {
        None => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case("all") => Ok(None),
        Some(raw) => parse_arg(Some(raw)),
    }
}
