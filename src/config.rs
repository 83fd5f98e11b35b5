// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::peers::{ClassificationField, DEFAULT_MAX_PEERS};
use crate::pipeline::PipelineOptions;

pub const CATALOG_ENV: &str = "PEERSCOPE_CATALOG";
pub const PRICES_DIR_ENV: &str = "PEERSCOPE_PRICES_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub prices_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub classification: ClassificationField,
    #[serde(default = "default_max_peers")]
    pub max_peers: usize,
    /// Price rows on or before this date are ignored.
    #[serde(default = "default_history_floor")]
    pub history_floor: Option<NaiveDate>,
    #[serde(default = "default_excluded_names")]
    pub excluded_names: Vec<String>,
    #[serde(default = "default_selectable_marker")]
    pub selectable_marker: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_max_peers() -> usize {
    DEFAULT_MAX_PEERS
}

fn default_history_floor() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2000, 1, 1)
}

fn default_excluded_names() -> Vec<String> {
    vec!["Associated Capital Group".to_string(), "ABB Ltd".to_string()]
}

fn default_selectable_marker() -> Option<String> {
    Some("Common Stock".to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("data/full_financial_stocks_raw.csv"),
            prices_dir: PathBuf::from("data/stocks"),
            output_dir: default_output_dir(),
            classification: ClassificationField::Industry,
            max_peers: DEFAULT_MAX_PEERS,
            history_floor: default_history_floor(),
            excluded_names: default_excluded_names(),
            selectable_marker: default_selectable_marker(),
        }
    }
}

impl Config {
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            classification: self.classification,
            max_peers: self.max_peers,
            history_floor: self.history_floor,
        }
    }

    /// Let `PEERSCOPE_CATALOG` / `PEERSCOPE_PRICES_DIR` override the file paths.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = env::var(CATALOG_ENV) {
            self.catalog_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var(PRICES_DIR_ENV) {
            self.prices_dir = PathBuf::from(dir);
        }
        self
    }
}

pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to the built-in defaults.
pub fn load_config_or_default(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!("No config at {}, using defaults", path.display());
        Ok(Config::default())
    }
}

pub fn save_config(config: &Config, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let config_str = toml::to_string_pretty(config)?;
    fs::write(path, config_str)?;
    Ok(())
}
