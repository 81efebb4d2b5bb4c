// Configuration loading for the Trellis framework

pub mod bootstrap;
pub mod error;
pub mod loader;

pub use bootstrap::{LoadConfiguration, RegisterProviders};
pub use error::{ConfigError, Result};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::env;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Shared configuration tree with dotted-key access.
///
/// Keys like `"app.timezone"` traverse nested objects; top-level
/// namespaces usually correspond to the config file they were loaded
/// from. Cheap to clone, safe to share across threads.
#[derive(Clone)]
pub struct ConfigRepository {
    root: Arc<RwLock<serde_json::Map<String, Value>>>,
}

impl ConfigRepository {
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(serde_json::Map::new())),
        }
    }

    /// Load a file and merge its top-level keys into the tree.
    pub fn load_file(&self, path: &Path) -> Result<()> {
        let data = loader::read_file(path)?;

        let mut root = self.root.write().unwrap();
        if let Value::Object(map) = data {
            for (key, value) in map {
                root.insert(key, value);
            }
        }
        Ok(())
    }

    /// Load a file under a namespace, so `config/app.toml` loaded as
    /// `"app"` is queried with `"app.timezone"`.
    pub fn load_named(&self, name: &str, path: &Path) -> Result<()> {
        let data = loader::read_file(path)?;
        self.root.write().unwrap().insert(name.to_string(), data);
        Ok(())
    }

    /// Merge process environment variables, lowercased, optionally
    /// filtered and stripped by prefix.
    pub fn load_env(&self, prefix: Option<&str>) {
        let mut root = self.root.write().unwrap();
        for (key, value) in env::vars() {
            let key = match prefix {
                Some(prefix) => {
                    if !key.starts_with(prefix) {
                        continue;
                    }
                    key.trim_start_matches(prefix).trim_start_matches('_').to_string()
                }
                None => key,
            };
            root.insert(key.to_lowercase(), Value::String(value));
        }
    }

    /// Set a value at a dotted key, creating intermediate objects.
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        let mut root = self.root.write().unwrap();
        let mut segments = key.split('.').peekable();
        let mut current = &mut *root;
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                current.insert(segment.to_string(), json_value);
                return Ok(());
            }
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            current = match entry {
                Value::Object(map) => map,
                other => {
                    *other = Value::Object(serde_json::Map::new());
                    match other {
                        Value::Object(map) => map,
                        _ => unreachable!(),
                    }
                }
            };
        }
        Ok(())
    }

    /// Get a value at a dotted key, deserialized into `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let root = self.root.read().unwrap();

        let mut current = root
            .get(first_segment(key))
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
        for segment in key.split('.').skip(1) {
            current = current
                .get(segment)
                .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
        }

        serde_json::from_value(current.clone())
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Get a value with a fallback default.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get::<Value>(key).is_ok()
    }

    /// Top-level namespace keys.
    pub fn keys(&self) -> Vec<String> {
        self.root.read().unwrap().keys().cloned().collect()
    }
}

impl Default for ConfigRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn first_segment(key: &str) -> &str {
    key.split('.').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_set_and_get_dotted() {
        let config = ConfigRepository::new();
        config.set("app.timezone", "UTC").unwrap();
        config.set("app.debug", true).unwrap();

        assert_eq!(config.get_string("app.timezone").unwrap(), "UTC");
        assert!(config.get_bool("app.debug").unwrap());
        assert!(config.has("app"));
        assert!(!config.has("app.missing"));
    }

    #[test]
    fn test_get_or_default() {
        let config = ConfigRepository::new();
        assert_eq!(config.get_or("missing.key", 9i64), 9);
    }

    #[test]
    fn test_missing_key_error_names_full_path() {
        let config = ConfigRepository::new();
        config.set("app.name", "trellis").unwrap();

        let err = config.get::<String>("app.locale").unwrap_err();
        assert!(err.to_string().contains("app.locale"));
    }

    #[test]
    fn test_load_named_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "timezone = \"UTC\"\n\n[log]\nlevel = \"debug\"").unwrap();

        let config = ConfigRepository::new();
        config.load_named("app", &path).unwrap();

        assert_eq!(config.get_string("app.timezone").unwrap(), "UTC");
        assert_eq!(config.get_string("app.log.level").unwrap(), "debug");
    }

    #[test]
    fn test_shared_across_clones() {
        let config = ConfigRepository::new();
        let other = config.clone();
        other.set("app.name", "trellis").unwrap();

        assert_eq!(config.get_string("app.name").unwrap(), "trellis");
    }
}
