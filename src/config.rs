use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tokenizer::DEFAULT_MODEL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default shard threshold in characters.
    #[serde(default)]
    pub split: Option<usize>,

    /// Extensions excluded on top of the built-in denylist.
    #[serde(default)]
    pub ignore_extensions: Vec<String>,

    #[serde(default = "default_tokenizer_model")]
    pub tokenizer_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            split: None,
            ignore_extensions: Vec::new(),
            tokenizer_model: default_tokenizer_model(),
        }
    }
}

fn default_tokenizer_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Loads the user configuration, falling back to defaults when there is no
/// config file (or no config directory at all).
pub fn load_config() -> Result<Config> {
    match get_config_path() {
        Ok(path) => load_config_from(&path),
        Err(_) => Ok(Config::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let config_str = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&config_str).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?
        .join("repo2text");
    Ok(config_dir.join("config.toml"))
}
