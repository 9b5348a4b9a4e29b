//! Planner configuration
//!
//! Loaded from a JSON file where every field is optional, then overridden from
//! the environment.

use crate::normalize::DropPolicy;
use crate::parser::{ResponseParser, DEFAULT_ARRAY_KEYS, DEFAULT_ARTIFACT_MARKERS};
use crate::seats::DEFAULT_AVAILABILITY_RATIO;
use crate::ItineraryError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-zero:free";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// No timeout unless set.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub drop_policy: DropPolicy,
    #[serde(default = "default_artifact_markers")]
    pub artifact_markers: Vec<String>,
    #[serde(default = "default_array_keys")]
    pub array_keys: Vec<String>,
    #[serde(default = "default_availability_ratio")]
    pub seat_availability_ratio: f64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_artifact_markers() -> Vec<String> {
    DEFAULT_ARTIFACT_MARKERS.iter().map(|m| m.to_string()).collect()
}

fn default_array_keys() -> Vec<String> {
    DEFAULT_ARRAY_KEYS.iter().map(|k| k.to_string()).collect()
}

fn default_availability_ratio() -> f64 {
    DEFAULT_AVAILABILITY_RATIO
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: None,
            drop_policy: DropPolicy::default(),
            artifact_markers: default_artifact_markers(),
            array_keys: default_array_keys(),
            seat_availability_ratio: default_availability_ratio(),
        }
    }
}

impl PlannerConfig {
    /// Read a JSON config file. A missing file yields the defaults; a file
    /// that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self, ItineraryError> {
        match fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "Loading planner config");
                serde_json::from_str(&content).map_err(|e| {
                    ItineraryError::ConfigError(format!("{}: {}", path.display(), e))
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ItineraryError::ConfigError(format!("{}: {}", path.display(), e))),
        }
    }

    /// Apply `OPENROUTER_API_KEY`, `ITINERARY_MODEL` and `ITINERARY_BASE_URL`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty("OPENROUTER_API_KEY") {
            self.api_key = key;
        }
        if let Some(model) = non_empty("ITINERARY_MODEL") {
            self.model = model;
        }
        if let Some(url) = non_empty("ITINERARY_BASE_URL") {
            self.base_url = url;
        }
        self
    }

    pub fn require_api_key(&self) -> Result<&str, ItineraryError> {
        if self.api_key.trim().is_empty() {
            return Err(ItineraryError::ConfigError(
                "no API key configured (set OPENROUTER_API_KEY or api_key in the config file)".to_string(),
            ));
        }
        Ok(&self.api_key)
    }

    /// Parser built from the configured markers and keys.
    pub fn parser(&self) -> Result<ResponseParser, ItineraryError> {
        Ok(ResponseParser::new()?
            .with_artifact_markers(self.artifact_markers.clone())
            .with_array_keys(self.array_keys.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = PlannerConfig::load(&dir.path().join("planner.json")).unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.model, "deepseek/deepseek-r1-zero:free");
        assert_eq!(config.drop_policy, DropPolicy::Warn);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.json");
        fs::write(&path, r#"{"model": "openai/gpt-4o-mini", "drop_policy": "strict", "timeout_secs": 30}"#).unwrap();

        let config = PlannerConfig::load(&path).unwrap();
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.drop_policy, DropPolicy::Strict);
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.artifact_markers.len(), 4);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.json");
        fs::write(&path, "model = nope").unwrap();
        assert!(matches!(PlannerConfig::load(&path), Err(ItineraryError::ConfigError(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [("OPENROUTER_API_KEY", "sk-test"), ("ITINERARY_MODEL", "  ")]
            .into_iter()
            .collect();
        let config = PlannerConfig::default().with_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_require_api_key() {
        assert!(PlannerConfig::default().require_api_key().is_err());
        let config = PlannerConfig { api_key: "sk-1".to_string(), ..PlannerConfig::default() };
        assert_eq!(config.require_api_key().unwrap(), "sk-1");
    }
}
