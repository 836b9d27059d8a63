use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

const APP_NAME: &str = "yo";

/// Operator preferences in `prefs.toml`. Every field is optional so an old
/// or hand-edited file still loads.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub backend_url: Option<String>,
  pub log_level: Option<String>,
}

impl Config {
  /// A missing file is the default. An unreadable one is an error, returned
  /// rather than logged since this runs before logging is set up.
  pub fn load() -> Result<Self> {
    let Some(path) = Self::path() else { return Ok(Self::default()) };
    match std::fs::read_to_string(&path) {
      Ok(content) => Self::parse(&content).with_context(|| format!("Invalid {}", path.display())),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
      Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
  }

  fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }

  pub fn save(&self) {
    let Some(path) = Self::path() else { return };
    if let Some(dir) = path.parent()
      && std::fs::create_dir_all(dir).is_ok()
      && let Ok(content) = toml::to_string(self)
      && let Err(e) = std::fs::write(&path, content)
    {
      warn!(err = %e, path = %path.display(), "could not save preferences");
    }
  }

  fn path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("prefs.toml"))
  }

  /// Directory for the log file.
  pub fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().to_path_buf())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_file_loads() {
    let cfg = Config::parse("theme_name = \"Nord\"\n").unwrap();
    assert_eq!(cfg.theme_name.as_deref(), Some("Nord"));
    assert_eq!(cfg.backend_url, None);
  }

  #[test]
  fn garbage_is_an_error() {
    assert!(Config::parse("not = [toml").is_err());
  }

  #[test]
  fn round_trips_through_toml() {
    let cfg = Config {
      theme_name: Some("Paper".into()),
      backend_url: Some("http://10.0.0.2:8765".into()),
      log_level: Some("debug".into()),
    };
    let text = toml::to_string(&cfg).unwrap();
    assert_eq!(Config::parse(&text).unwrap(), cfg);
  }
}
