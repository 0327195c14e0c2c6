//! Configuration loading and management
//!
//! Handles parsing of the optional `config.toml` in the data directory.

use std::path::Path;

use serde::Deserialize;

use crate::model::{
    Priority, DEFAULT_CATEGORY, DEFAULT_EVERY_DAYS, MAX_EVERY_DAYS, MIN_EVERY_DAYS,
};
use crate::transfer::DEFAULT_EXPORT_PREFIX;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Backup export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Defaults applied to new tasks and views
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Backup export configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// File name prefix; the export date is appended
    #[serde(default = "default_export_prefix")]
    pub prefix: String,
}

fn default_export_prefix() -> String {
    DEFAULT_EXPORT_PREFIX.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            prefix: default_export_prefix(),
        }
    }
}

/// Defaults for new tasks and list views
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    /// Place used when none is given; the first known place otherwise
    #[serde(default)]
    pub place: Option<String>,

    #[serde(default = "default_category")]
    pub category: String,

    /// 1 (low) to 3 (high)
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Recurrence interval for newly enabled recurrences
    #[serde(default = "default_every_days")]
    pub every_days: u16,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_priority() -> u8 {
    Priority::default().level()
}

fn default_every_days() -> u16 {
    DEFAULT_EVERY_DAYS
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            place: None,
            category: default_category(),
            priority: default_priority(),
            every_days: default_every_days(),
        }
    }
}

impl DefaultsConfig {
    pub fn priority(&self) -> Priority {
        Priority::clamped(i64::from(self.priority))
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config.toml` from the data directory, or return defaults
    pub fn load_from_dir(data_dir: &Path) -> Self {
        Self::load_or_default(&data_dir.join(crate::storage::CONFIG_FILE))
    }

    /// Load a file if it exists; invalid files fall back to defaults
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.export.validate()?;
        self.defaults.validate()?;
        Ok(())
    }
}

impl ExportConfig {
    fn validate(&self) -> crate::error::Result<()> {
        let prefix = self.prefix.trim();
        if prefix.is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "export.prefix cannot be empty".to_string(),
            ));
        }
        if prefix.contains(['/', '\\']) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "export.prefix '{prefix}' must not contain path separators"
            )));
        }
        Ok(())
    }
}

impl DefaultsConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if let Some(place) = self.place.as_deref() {
            if place.trim().is_empty() {
                return Err(crate::error::Error::InvalidConfig(
                    "defaults.place cannot be empty".to_string(),
                ));
            }
        }
        if self.category.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "defaults.category cannot be empty".to_string(),
            ));
        }
        if !(1..=3).contains(&self.priority) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "defaults.priority must be 1..=3, got {}",
                self.priority
            )));
        }
        if !(MIN_EVERY_DAYS..=MAX_EVERY_DAYS).contains(&self.every_days) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "defaults.every_days must be {MIN_EVERY_DAYS}..={MAX_EVERY_DAYS}, got {}",
                self.every_days
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.export.prefix, "hogares_backup");
        assert_eq!(cfg.defaults.place, None);
        assert_eq!(cfg.defaults.category, "General");
        assert_eq!(cfg.defaults.priority(), Priority::Medium);
        assert_eq!(cfg.defaults.every_days, 30);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let content = r#"
[export]
prefix = "casa"

[defaults]
place = "casa_cata"
category = "Cocina"
priority = 3
every_days = 14
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.export.prefix, "casa");
        assert_eq!(cfg.defaults.place.as_deref(), Some("casa_cata"));
        assert_eq!(cfg.defaults.category, "Cocina");
        assert_eq!(cfg.defaults.priority(), Priority::High);
        assert_eq!(cfg.defaults.every_days, 14);
    }

    #[test]
    fn invalid_values_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        for content in [
            "[export]\nprefix = \"\"",
            "[export]\nprefix = \"a/b\"",
            "[defaults]\npriority = 5",
            "[defaults]\nevery_days = 0",
            "[defaults]\nplace = \" \"",
        ] {
            fs::write(&path, content).expect("write config");
            let err = Config::load(&path).expect_err("invalid config");
            match err {
                crate::error::Error::InvalidConfig(_) => {}
                other => panic!("unexpected error for {content:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn load_from_dir_defaults_when_missing_or_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.export.prefix, "hogares_backup");

        fs::write(dir.path().join("config.toml"), "this = [not valid").expect("write");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.export.prefix, "hogares_backup");
    }
}
