//! # Configuration
//!
//! Environment-scoped configuration entries.
//!
//! ## Environment Variants
//!
//! An entry whose content is an object holding a key equal to the active
//! environment tag is narrowed to that key's value when it is set:
//!
//! ```text
//! set("main", { "development": {...dev}, "production": {...prod} })
//!                         │
//!        env = production ▼
//! get("main") == {...prod}
//! ```
//!
//! Entries with falsy content are ignored on `set`.

use crate::error::{FluxError, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use tracing::{debug, trace};

/// Deployment environment tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
    /// Any other tag, kept verbatim.
    Other(String),
}

impl Environment {
    /// Tag used as a key in environment-keyed config entries.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
            Self::Other(tag) => tag,
        }
    }

    /// Read the environment from `FLUXONE_ENV`, then `NODE_ENV`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`Environment::from_env`] with an arbitrary variable source.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup("FLUXONE_ENV")
            .or_else(|| lookup("NODE_ENV"))
            .filter(|tag| !tag.is_empty())
            .map(|tag| Self::from(tag.as_str()))
            .unwrap_or_default()
    }
}

impl From<&str> for Environment {
    fn from(tag: &str) -> Self {
        match tag {
            "development" => Self::Development,
            "testing" => Self::Testing,
            "production" => Self::Production,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JavaScript-style truthiness of a JSON value.
///
/// `null`, `false`, `0` and `""` are falsy. Objects and arrays are truthy
/// even when empty.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && f.is_finite()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Environment-scoped configuration store.
///
/// Interior mutability lets one instance be shared through the container.
pub struct ConfigManager {
    registry: RwLock<HashMap<String, Value>>,
    env: Environment,
}

impl ConfigManager {
    /// Create a manager and apply `bundle` with [`ConfigManager::set_many`].
    pub fn new(bundle: &Value, env: Environment) -> Result<Self> {
        let manager = Self {
            registry: RwLock::new(HashMap::new()),
            env,
        };
        manager.set_many(bundle)?;
        Ok(manager)
    }

    /// Active environment.
    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Stored value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.registry.read().get(name).cloned()
    }

    /// Stored value for `name`, deserialized into `T`.
    pub fn get_as<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.get(name)
            .map(|value| {
                serde_json::from_value(value).map_err(|e| {
                    FluxError::InvalidArgument(format!("config '{name}' has unexpected shape: {e}"))
                })
            })
            .transpose()
    }

    /// Whether `name` holds a truthy value.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.registry.read().get(name).is_some_and(is_truthy)
    }

    /// Store `config` under `name`, narrowed to the active environment.
    ///
    /// No-op when `config` is falsy.
    pub fn set(&self, name: impl Into<String>, config: Value) {
        if !is_truthy(&config) {
            return;
        }
        let name = name.into();

        let value = match config {
            Value::Object(mut variants) if variants.contains_key(self.env.as_str()) => {
                trace!(name = %name, env = %self.env, "Selecting environment variant");
                variants.remove(self.env.as_str()).unwrap_or(Value::Null)
            }
            other => other,
        };

        self.registry.write().insert(name, value);
    }

    /// Apply `set` to every entry of a bundle.
    ///
    /// A bundle is either an object (`name → content`) or an array of
    /// `{ "name": ..., "content": ... }` objects. A falsy bundle is ignored;
    /// any other shape is `InvalidArgument`.
    pub fn set_many(&self, bundle: &Value) -> Result<()> {
        if !is_truthy(bundle) {
            return Ok(());
        }

        match bundle {
            Value::Object(entries) => {
                for (name, content) in entries {
                    self.set(name.clone(), content.clone());
                }
            }
            Value::Array(entries) => {
                for entry in entries {
                    let name = entry.get("name").and_then(Value::as_str).ok_or_else(|| {
                        FluxError::InvalidArgument(format!(
                            "config bundle entry must have a string 'name', got {entry}"
                        ))
                    })?;
                    let content = entry.get("content").cloned().unwrap_or(Value::Null);
                    self.set(name, content);
                }
            }
            _ => {
                return Err(FluxError::InvalidArgument(
                    "Invalid config bundle, it must be an array or object.".into(),
                ))
            }
        }

        debug!(entries = self.registry.read().len(), env = %self.env, "Config bundle applied");
        Ok(())
    }

    /// Read a JSON bundle from `path` and apply it with `set_many`.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FluxError::InvalidArgument(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let bundle: Value = serde_json::from_str(&text).map_err(|e| {
            FluxError::InvalidArgument(format!("cannot parse config file {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), "Loading config file");
        self.set_many(&bundle)
    }

    /// Names of the stored entries, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigManager")
            .field("env", &self.env)
            .field("names", &self.names())
            .finish()
    }
}
