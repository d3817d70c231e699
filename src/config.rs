use crate::error::{Result, TdError};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_FILE: &str = "todo.md";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub lang: String,
    pub file: String,
    /// Directory searched for `<lang>.json` before the built-in tables.
    pub locales_dir: Option<String>,
    pub log_file: Option<String>,
}

impl Config {
    pub fn base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join(".config")
            .join("td")
    }

    pub fn config_path() -> PathBuf {
        Self::base_dir().join("config.toml")
    }

    /// Load `~/.config/td/config.toml`. A missing file is not an error.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| TdError::Config(e.to_string()))
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn with_overrides(mut self, lang: Option<String>, file: Option<String>) -> Self {
        if let Some(lang) = lang {
            self.lang = lang;
        }
        if let Some(file) = file {
            self.file = file;
        }
        self
    }

    pub fn resolved_locales_dir(&self) -> Option<PathBuf> {
        self.locales_dir.as_deref().map(expand_tilde)
    }

    pub fn resolved_log_file(&self) -> Option<PathBuf> {
        self.log_file.as_deref().map(expand_tilde)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            file: DEFAULT_FILE.to_string(),
            locales_dir: None,
            log_file: None,
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_toml("lang = \"zh\"\n").unwrap();
        assert_eq!(config.lang, "zh");
        assert_eq!(config.file, DEFAULT_FILE);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let err = Config::from_toml("lang = [").unwrap_err();
        assert!(matches!(err, TdError::Config(_)));
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let config = Config::from_toml("lang = \"zh\"\nfile = \"a.md\"\n")
            .unwrap()
            .with_overrides(None, Some("b.md".to_string()));
        assert_eq!(config.lang, "zh");
        assert_eq!(config.file, "b.md");
    }

    #[test]
    fn test_tilde_expansion() {
        let config = Config {
            log_file: Some("~/td.log".to_string()),
            ..Config::default()
        };
        let path = config.resolved_log_file().unwrap();
        assert!(path.ends_with("td.log"));
        assert!(!path.starts_with("~"));
    }
}
