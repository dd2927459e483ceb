use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = "eventy.log";

/// Placeholder host prefix in feed URLs that gets swapped for the chosen region.
pub const URL_PLACEHOLDER: &str = "//eu";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subdomain {
    Na,
    #[default]
    Eu,
    Fr,
    De,
    Jp,
}

impl Subdomain {
    pub const ALL: [Subdomain; 5] = [
        Subdomain::Na,
        Subdomain::Eu,
        Subdomain::Fr,
        Subdomain::De,
        Subdomain::Jp,
    ];

    pub fn to_value(self) -> &'static str {
        match self {
            Subdomain::Na => "na",
            Subdomain::Eu => "eu",
            Subdomain::Fr => "fr",
            Subdomain::De => "de",
            Subdomain::Jp => "jp",
        }
    }

    pub fn to_name(self) -> &'static str {
        match self {
            Subdomain::Na => "North America",
            Subdomain::Eu => "Europe",
            Subdomain::Fr => "France",
            Subdomain::De => "Germany",
            Subdomain::Jp => "Japan",
        }
    }

    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    /// Point an event URL at this region.
    pub fn apply(self, url: &str) -> String {
        url.replace(URL_PLACEHOLDER, &format!("//{}", self.to_value()))
    }
}

/// User settings, persisted as JSON next to the events cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub show_status_entry: bool,
    pub use_short_version: bool,
    pub hide_for_zero_events: bool,
    pub show_pvp: bool,
    pub show_completed_events: bool,
    pub completed_events: BTreeSet<i64>,
    pub subdomain: Subdomain,
    pub translate_names: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_status_entry: true,
            use_short_version: false,
            hide_for_zero_events: false,
            show_pvp: true,
            show_completed_events: true,
            completed_events: BTreeSet::new(),
            subdomain: Subdomain::default(),
            translate_names: true,
        }
    }
}

impl Settings {
    pub fn is_completed(&self, id: i64) -> bool {
        self.completed_events.contains(&id)
    }

    /// Flip the completed mark of an event; returns the new state.
    pub fn toggle_completed(&mut self, id: i64) -> bool {
        if self.completed_events.remove(&id) {
            false
        } else {
            self.completed_events.insert(id);
            true
        }
    }
}

/// Where settings, cache and log live.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Platform config dir joined with `eventy`, or `./.eventy` when the
    /// platform has none.
    pub fn default_location() -> Self {
        let root = dirs::config_dir()
            .map(|dir| dir.join("eventy"))
            .unwrap_or_else(|| PathBuf::from(".eventy"));
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE_NAME)
    }

    pub fn ensure(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    pub fn try_load_settings(&self) -> Result<Option<Settings>, ConfigError> {
        let path = self.config_file();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Load settings, falling back to defaults when the file is missing or bad.
    pub fn load_settings(&self) -> Settings {
        match self.try_load_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                info!(path = %self.config_file().display(), "no settings file, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!(path = %self.config_file().display(), error = %e, "ignoring settings file");
                Settings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), ConfigError> {
        self.ensure()?;
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(self.config_file(), json)?;
        Ok(())
    }
}
