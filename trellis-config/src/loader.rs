// File parsing for the configuration tree.
//
// TOML is the primary on-disk format; JSON is accepted for generated
// files. Everything normalizes to a `serde_json::Value` tree so
// `ConfigRepository` has a single value model regardless of source.
// Dotenv files are not handled here; `LoadConfiguration` feeds those
// through `dotenvy` into the process environment instead.

use crate::{ConfigError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Read and parse the file at `path`, picking the parser from its
/// extension.
pub fn read_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("toml") => parse_toml(&content),
        Some(ext) if ext.eq_ignore_ascii_case("json") => parse_json(&content),
        Some(other) => Err(ConfigError::LoadError(format!(
            "Unsupported config format [{}] in {}",
            other,
            path.display()
        ))),
        None => Err(ConfigError::LoadError(format!(
            "Cannot infer config format of {}",
            path.display()
        ))),
    }
}

pub fn parse_toml(content: &str) -> Result<Value> {
    let table: toml::Value = toml::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

    // toml::Value serializes cleanly into the JSON data model.
    serde_json::to_value(&table).map_err(|e| ConfigError::SerializationError(e.to_string()))
}

pub fn parse_json(content: &str) -> Result<Value> {
    serde_json::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))
}
