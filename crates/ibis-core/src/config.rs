//! Configuration loading and parsing for Ibis.
//!
//! Provides functionality to load and parse `ibis.toml` configuration files.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "ibis.toml";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["include", "exclude", "parser"];
const KNOWN_PARSER_KEYS: &[&str] = &["typescript", "jsx", "decorators"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub parser: ParserConfig,
}

/// Syntax options handed to the parser front end.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    pub typescript: bool,
    pub jsx: bool,
    pub decorators: bool,
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    if let Some(toml::Value::Table(parser)) = table.get("parser") {
        let known_parser: HashSet<&str> = KNOWN_PARSER_KEYS.iter().copied().collect();
        for key in parser.keys() {
            if !known_parser.contains(key.as_str()) {
                warnings.push(format!("Unknown config option in [parser]: '{}'", key));
            }
        }
    }

    warnings
}

pub fn load_config_or_default(start_dir: &Path) -> Config {
    find_config_file(start_dir)
        .and_then(|path| load_config(&path).ok())
        .unwrap_or_default()
}
