//! User configuration.
//!
//! Stored as JSON in `~/.codememo/config.json`. A missing file is created
//! with defaults; a file missing some keys is completed and written back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error for config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot locate the home directory")]
    NoHome,
}

/// How text read from source files is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextInputConfig {
    pub convert_tab_to_spaces: bool,
    pub tab_to_spaces_number: usize,
}

impl Default for TextInputConfig {
    fn default() -> Self {
        Self {
            convert_tab_to_spaces: true,
            tab_to_spaces_number: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub text_input: TextInputConfig,
    /// Language tag for files whose extension is not recognized.
    pub default_lang: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            text_input: TextInputConfig::default(),
            default_lang: "raw".to_string(),
        }
    }
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
        Ok(home.join(".codememo").join("config.json"))
    }

    /// Loads the config at `path`, creating or completing it as needed.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.write(path)?;
            debug!(path = %path.display(), "created default config");
            return Ok(config);
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let json_err = |source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        };
        let raw: Value = serde_json::from_str(&text).map_err(json_err)?;
        let config: Config = serde_json::from_value(raw.clone()).map_err(json_err)?;
        let complete = serde_json::to_value(&config).map_err(json_err)?;

        let unknown = unknown_keys(&complete, &raw, "");
        if !unknown.is_empty() {
            warn!(keys = ?unknown, "ignoring unknown config keys");
        }
        if !all_keys_exist(&complete, &raw) {
            debug!(path = %path.display(), "filling in missing config keys");
            config.write(path)?;
        }
        Ok(config)
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(io_err)
    }

    /// Applies the text input settings to source text.
    pub fn normalize_text(&self, text: &str) -> String {
        if self.text_input.convert_tab_to_spaces {
            text.replace('\t', &" ".repeat(self.text_input.tab_to_spaces_number))
        } else {
            text.to_string()
        }
    }
}

/// True if every key of `template` (recursively) is present in `target`.
fn all_keys_exist(template: &Value, target: &Value) -> bool {
    let (Value::Object(template), Value::Object(target)) = (template, target) else {
        return true;
    };
    template.iter().all(|(key, value)| match target.get(key) {
        Some(found) => all_keys_exist(value, found),
        None => false,
    })
}

/// Dotted paths of keys in `target` that `template` does not know.
fn unknown_keys(template: &Value, target: &Value, prefix: &str) -> Vec<String> {
    let (Value::Object(template), Value::Object(target)) = (template, target) else {
        return Vec::new();
    };
    let mut unknown = Vec::new();
    for (key, value) in target {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match template.get(key) {
            Some(known) => unknown.extend(unknown_keys(known, value, &path)),
            None => unknown.push(path),
        }
    }
    unknown
}
