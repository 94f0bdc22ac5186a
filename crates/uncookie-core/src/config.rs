use crate::error::{Result, UncookieError};
use crate::handler::Handler;
use crate::interpreter::DEFAULT_MAX_DEPTH;
use crate::loader::DEFAULT_CACHE_TTL;
use crate::paths;
use crate::schema::ActionGroup;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_HANDLER_NAME: &str = "un_cookies_list.json";
pub const DEFAULT_HANDLER_SCHEMA: &str =
    "https://gist.githubusercontent.com/nsrau/c3a4430e7255223cb2e40844f4f98ca4/raw";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub handlers: Vec<Handler>,
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_debug() -> bool {
    true
}

fn default_max_chain_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            handlers: default_handlers(),
            debug: default_debug(),
            max_chain_depth: default_max_chain_depth(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// The handler list a fresh install starts with.
pub fn default_handlers() -> Vec<Handler> {
    vec![Handler::new(DEFAULT_HANDLER_NAME, DEFAULT_HANDLER_SCHEMA)]
}

impl Config {
    /// Load `<root>/.uncookie/config.yaml`, or the default config when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        match crate::io::read_optional(&path)? {
            Some(data) => Ok(serde_yaml::from_str(&data)?),
            None => Ok(Config::default()),
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    // -----------------------------------------------------------------------
    // Handler list
    // -----------------------------------------------------------------------

    pub fn add_handler(&mut self, handler: Handler) -> usize {
        self.handlers.push(handler);
        self.handlers.len() - 1
    }

    /// Replace the name and/or schema of the handler at `index`.
    pub fn update_handler(
        &mut self,
        index: usize,
        name: Option<String>,
        schema: Option<String>,
    ) -> Result<&Handler> {
        let handler = self
            .handlers
            .get_mut(index)
            .ok_or(UncookieError::HandlerNotFound(index))?;
        if let Some(name) = name {
            handler.name = name;
        }
        if let Some(schema) = schema {
            handler.schema = schema;
        }
        Ok(handler)
    }

    pub fn remove_handler(&mut self, index: usize) -> Result<Handler> {
        if index >= self.handlers.len() {
            return Err(UncookieError::HandlerNotFound(index));
        }
        Ok(self.handlers.remove(index))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.handlers.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no handlers configured; nothing will run".to_string(),
            });
        }

        for (index, handler) in self.handlers.iter().enumerate() {
            if handler.name.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("handler {index} has an empty name"),
                });
            }
            if handler.is_remote() {
                continue;
            }
            if let Err(e) = serde_json::from_str::<serde_json::Value>(&handler.schema) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("handler {index} ('{}') schema is not valid JSON: {e}", handler.name),
                });
                continue;
            }
            if ActionGroup::detect_text(&handler.schema).is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("handler {index} ('{}') schema has no actions", handler.name),
                });
            }
        }

        if self.max_chain_depth == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "max_chain_depth is 0; onSuccess/onError chains will never run"
                    .to_string(),
            });
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_default_handler() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.handlers, default_handlers());
        assert!(cfg.debug);
        assert_eq!(cfg.max_chain_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn save_load_preserves_order_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config {
            handlers: Vec::new(),
            debug: false,
            ..Config::default()
        };
        cfg.add_handler(Handler::new("*", "[]"));
        cfg.add_handler(Handler::new("*", "[]"));
        cfg.add_handler(Handler::new("example.com", r##"[{"action":"remove","target":"#x"}]"##));
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        crate::io::atomic_write(
            &paths::config_path(dir.path()),
            b"handlers:\n  - rulesetName: example.com\n    schema: '[]'\n",
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.handlers[0].name, "example.com");
        assert!(cfg.debug);
        assert_eq!(cfg.cache_ttl_secs, 3600);
    }

    #[test]
    fn update_and_remove_by_index() {
        let mut cfg = Config::default();
        cfg.add_handler(Handler::new("a.com", "[]"));
        cfg.update_handler(1, None, Some("[{}]".into())).unwrap();
        assert_eq!(cfg.handlers[1].schema, "[{}]");
        assert!(matches!(
            cfg.update_handler(9, Some("x".into()), None),
            Err(UncookieError::HandlerNotFound(9))
        ));
        let removed = cfg.remove_handler(0).unwrap();
        assert_eq!(removed.name, DEFAULT_HANDLER_NAME);
        assert_eq!(cfg.handlers.len(), 1);
        assert!(cfg.remove_handler(5).is_err());
    }

    #[test]
    fn validate_flags_bad_handlers() {
        let cfg = Config {
            handlers: vec![
                Handler::new("", "[]"),
                Handler::new("a.com", "{not json"),
                Handler::new("b.com", r#"{"action":"remove"}"#),
                Handler::new("c.com", "https://example.com/rules.json"),
            ],
            ..Config::default()
        };
        let warnings = cfg.validate();
        let errors: Vec<_> = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .collect();
        assert_eq!(errors.len(), 2, "{warnings:?}");
        assert!(errors[0].message.contains("empty name"));
        assert!(errors[1].message.contains("not valid JSON"));
        // "" with [] and b.com with a non-array top level both have no actions.
        let empty = warnings
            .iter()
            .filter(|w| w.message.contains("no actions"))
            .count();
        assert_eq!(empty, 2);
    }

    #[test]
    fn validate_warns_on_empty_list() {
        let cfg = Config {
            handlers: Vec::new(),
            ..Config::default()
        };
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
    }
}
