use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdf-highlighter";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Quiet period before a text selection becomes a ghost highlight
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Headroom left above a highlight when scrolling to it
    #[serde(default = "default_scroll_margin_px")]
    pub scroll_margin_px: f64,

    /// How long our own scroll is ignored after jumping to a highlight
    #[serde(default = "default_focus_grace_ms")]
    pub focus_grace_ms: u64,

    /// Area drags smaller than this on either axis are dropped
    #[serde(default = "default_min_area_size_px")]
    pub min_area_size_px: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_scroll_margin_px() -> f64 {
    10.0
}

fn default_focus_grace_ms() -> u64 {
    100
}

fn default_min_area_size_px() -> f64 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            scroll_margin_px: default_scroll_margin_px(),
            focus_grace_ms: default_focus_grace_ms(),
            min_area_size_px: default_min_area_size_px(),
            store_dir: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn focus_grace(&self) -> Duration {
        Duration::from_millis(self.focus_grace_ms)
    }

    /// Directory for the JSON highlight store
    pub fn resolved_store_dir(&self) -> Option<PathBuf> {
        self.store_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|data| data.join(APP_NAME)))
    }

    /// `log_level` as a filter; unknown names fall back to info
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            warn!("Unknown log level {:?}, using info", self.log_level);
            log::LevelFilter::Info
        })
    }

    /// Load from the default location, or defaults when there is none
    pub fn load_default() -> Self {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => {
                warn!("Could not determine config directory, using default settings");
                Self::default()
            }
        }
    }

    /// Load from `path`. Missing, unreadable or unparsable files yield
    /// defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("Settings file {path:?} not found, using defaults");
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                error!("Failed to parse settings file {path:?}: {e}");
                Self::default()
            }),
            Err(e) => {
                error!("Failed to read settings file {path:?}: {e}");
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(content)?;
        debug!("Parsed settings: {settings:?}");
        Ok(settings)
    }

    pub fn save(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    error!("Failed to create config directory {parent:?}: {e}");
                    return;
                }
            }
        }
        let content = match serde_yaml::to_string(self) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to serialize settings: {e}");
                return;
            }
        };
        match fs::write(path, content) {
            Ok(()) => debug!("Saved settings to {path:?}"),
            Err(e) => error!("Failed to save settings to {path:?}: {e}"),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = Settings::parse("settle_delay_ms: 250\n").unwrap();
        assert_eq!(settings.settle_delay(), Duration::from_millis(250));
        assert_eq!(settings.scroll_margin_px, 10.0);
        assert_eq!(settings.focus_grace(), Duration::from_millis(100));
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
    }

    #[test]
    fn bad_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "settle_delay_ms: [not a number").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
        assert_eq!(
            Settings::load(&temp.path().join("missing.yaml")),
            Settings::default()
        );
    }

    #[test]
    fn save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub").join("config.yaml");
        let settings = Settings {
            min_area_size_px: 4.0,
            store_dir: Some(temp.path().join("store")),
            log_level: "debug".into(),
            ..Settings::default()
        };
        settings.save(&path);
        let loaded = Settings::load(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.level_filter(), log::LevelFilter::Debug);
        assert_eq!(loaded.resolved_store_dir(), Some(temp.path().join("store")));
    }

    #[test]
    fn unknown_level_is_info() {
        let settings = Settings {
            log_level: "chatty".into(),
            ..Settings::default()
        };
        assert_eq!(settings.level_filter(), log::LevelFilter::Info);
    }
}
