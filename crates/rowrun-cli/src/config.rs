//! Configuration file support for rowrun.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/rowrun/config.toml` (lowest priority)
//! - Project-local: `.rowrun.toml` (searched up directory tree)
//! - An explicit `--config <PATH>` file
//! - CLI flags (highest priority, applied by each command)

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rowrun_core::{SelectionDialog, STANDARD_CHOICES, STANDARD_SENSITIVE};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".rowrun.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub run: RunConfigSection,
    pub output: OutputConfig,
    pub selection: SelectionConfig,
}

/// Processing run settings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfigSection {
    /// Delay before each record, in milliseconds.
    pub delay_ms: Option<u64>,
    /// Run log location.
    pub log_file: Option<PathBuf>,
}

/// Output formatting settings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Show the progress bar during `process`.
    pub progress: Option<bool>,
    /// Stream the run log while processing.
    pub show_log: Option<bool>,
}

/// Choice dialog settings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    pub choices: Option<Vec<String>>,
    /// Choice that needs a confirmation before it is committed.
    pub sensitive: Option<String>,
}

impl AppConfig {
    /// Load configuration from the XDG file, the nearest project file and
    /// an optional explicit file, in increasing priority.
    ///
    /// Missing or unreadable discovered files are skipped with a warning.
    /// An explicit file must exist and parse. The merged result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Self::load_from(xdg_config_path().as_deref(), &cwd, explicit)
    }

    pub fn load_from(xdg: Option<&Path>, cwd: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_discovered(xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_config_in_parents(cwd) {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_discovered(&project_path) {
                config.merge(project_config);
            }
        }

        if let Some(path) = explicit {
            info!("Loading config: {}", path.display());
            config.merge(load_file(path)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings no command could work with.
    pub fn validate(&self) -> Result<()> {
        if let Some(choices) = &self.selection.choices {
            if choices.is_empty() {
                bail!("selection.choices must not be empty");
            }
        }
        if let Some(sensitive) = &self.selection.sensitive {
            let known = match &self.selection.choices {
                Some(choices) => choices.iter().any(|c| c == sensitive),
                None => STANDARD_CHOICES.contains(&sensitive.as_str()),
            };
            if !known {
                bail!("selection.sensitive '{sensitive}' is not one of the configured choices");
            }
        }
        Ok(())
    }

    /// Values from `other` override values in `self` when present.
    pub fn merge(&mut self, other: Self) {
        self.run.delay_ms = other.run.delay_ms.or(self.run.delay_ms);
        self.run.log_file = other.run.log_file.or_else(|| self.run.log_file.take());

        self.output.progress = other.output.progress.or(self.output.progress);
        self.output.show_log = other.output.show_log.or(self.output.show_log);

        self.selection.choices = other
            .selection
            .choices
            .or_else(|| self.selection.choices.take());
        self.selection.sensitive = other
            .selection
            .sensitive
            .or_else(|| self.selection.sensitive.take());
    }

    /// Dialog built from `[selection]`, or the standard three choices.
    pub fn dialog(&self) -> Result<SelectionDialog> {
        let Some(choices) = self.selection.choices.clone() else {
            let sensitive = self
                .selection
                .sensitive
                .clone()
                .unwrap_or_else(|| STANDARD_SENSITIVE.to_string());
            let choices = STANDARD_CHOICES.iter().map(|c| c.to_string()).collect();
            return Ok(SelectionDialog::new(choices, Some(sensitive))?);
        };
        Ok(SelectionDialog::new(
            choices,
            self.selection.sensitive.clone(),
        )?)
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rowrun").join("config.toml"))
}

/// Search for `.rowrun.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

fn load_discovered(path: &Path) -> Option<AppConfig> {
    match load_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Skipping config file: {e:#}");
            None
        }
    }
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: AppConfig = toml::from_str("").expect("parse empty config");
        assert!(config.run.delay_ms.is_none());
        assert!(config.selection.choices.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[run]
delay_ms = 20
log_file = "out/run.log"

[output]
progress = false
show_log = true

[selection]
choices = ["Keep", "Archive", "Delete"]
sensitive = "Delete"
"#;
        let config: AppConfig = toml::from_str(toml).expect("parse full config");
        assert_eq!(config.run.delay_ms, Some(20));
        assert_eq!(config.run.log_file, Some(PathBuf::from("out/run.log")));
        assert_eq!(config.output.progress, Some(false));
        assert_eq!(config.output.show_log, Some(true));
        assert_eq!(config.selection.sensitive.as_deref(), Some("Delete"));
        config.validate().expect("valid");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let parsed: std::result::Result<AppConfig, _> = toml::from_str("[run]\nspeed = 3\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_merge_configs() {
        let mut base: AppConfig = toml::from_str(
            r#"
[run]
delay_ms = 500
log_file = "base.log"
"#,
        )
        .expect("parse base");
        let override_config: AppConfig = toml::from_str(
            r#"
[run]
delay_ms = 10

[output]
show_log = true
"#,
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.run.delay_ms, Some(10));
        assert_eq!(base.run.log_file, Some(PathBuf::from("base.log")));
        assert_eq!(base.output.show_log, Some(true));
    }

    #[test]
    fn test_validation_rejects_empty_choices() {
        let config: AppConfig = toml::from_str("[selection]\nchoices = []\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_validation_rejects_unknown_sensitive_choice() {
        let config: AppConfig =
            toml::from_str("[selection]\nchoices = [\"a\", \"b\"]\nsensitive = \"c\"\n").unwrap();
        assert!(config.validate().is_err());

        let standard: AppConfig = toml::from_str("[selection]\nsensitive = \"Choice 9\"\n").unwrap();
        assert!(standard.validate().is_err());
    }

    #[test]
    fn test_layering_priority() {
        let dir = tempfile::tempdir().unwrap();
        let xdg = dir.path().join("xdg.toml");
        std::fs::write(&xdg, "[run]\ndelay_ms = 1\nlog_file = \"xdg.log\"\n").unwrap();

        let project_root = dir.path().join("project");
        let nested = project_root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            project_root.join(PROJECT_CONFIG_FILE),
            "[run]\ndelay_ms = 2\n[output]\nprogress = false\n",
        )
        .unwrap();

        let explicit = dir.path().join("explicit.toml");
        std::fs::write(&explicit, "[run]\ndelay_ms = 3\n").unwrap();

        let config = AppConfig::load_from(Some(&xdg), &nested, None).unwrap();
        assert_eq!(config.run.delay_ms, Some(2));
        assert_eq!(config.run.log_file, Some(PathBuf::from("xdg.log")));
        assert_eq!(config.output.progress, Some(false));

        let config = AppConfig::load_from(Some(&xdg), &nested, Some(&explicit)).unwrap();
        assert_eq!(config.run.delay_ms, Some(3));
    }

    #[test]
    fn test_broken_discovered_file_is_skipped_but_explicit_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "not = [toml").unwrap();
        let config = AppConfig::load_from(None, dir.path(), None).unwrap();
        assert!(config.run.delay_ms.is_none());

        let err = AppConfig::load_from(None, dir.path(), Some(&dir.path().join("missing.toml")))
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read config file"));
    }

    #[test]
    fn test_dialog_from_config() {
        let standard = AppConfig::default().dialog().unwrap();
        assert_eq!(standard.choices().len(), 3);
        assert!(standard.is_sensitive(2));

        let custom: AppConfig =
            toml::from_str("[selection]\nchoices = [\"x\", \"y\"]\n").unwrap();
        let dialog = custom.dialog().unwrap();
        assert!(!dialog.is_sensitive(0) && !dialog.is_sensitive(1));
    }
}
