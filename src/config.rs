use std::{net::SocketAddr, path::PathBuf};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_REPO_ID: &str = "Shashankhmg/citybike-demnd-prediction";
pub const DEFAULT_MODEL_FILE: &str = "RF.json";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// What to do when the model cannot be loaded at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPolicy {
    /// Load before binding; a load failure aborts the process.
    FailFast,
    /// Bind immediately, load in the background and answer 503 until ready.
    Degrade,
}

impl std::str::FromStr for StartupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "failfast" => Ok(StartupPolicy::FailFast),
            "degrade" => Ok(StartupPolicy::Degrade),
            other => Err(format!("expected fail-fast or degrade, got {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Hub credential; passed through as-is, never validated.
    pub hf_token: Option<String>,
    pub repo_id: String,
    pub model_file: String,
    /// Local artifact; when set, nothing is downloaded.
    pub model_path: Option<PathBuf>,
    pub startup_policy: StartupPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            hf_token: None,
            repo_id: DEFAULT_REPO_ID.to_string(),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            model_path: None,
            startup_policy: StartupPolicy::FailFast,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.port,
        };

        let startup_policy = match get("STARTUP_POLICY") {
            Some(raw) => raw.parse::<StartupPolicy>().map_err(|reason| ConfigError::Invalid {
                key: "STARTUP_POLICY",
                value: raw.clone(),
                reason,
            })?,
            None => defaults.startup_policy,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            hf_token: get("HF_ACCESS_TOKEN"),
            repo_id: get("MODEL_REPO").unwrap_or(defaults.repo_id),
            model_file: get("MODEL_FILE").unwrap_or(defaults.model_file),
            model_path: get("MODEL_PATH").map(PathBuf::from),
            startup_policy,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            key: "HOST",
            value: self.host.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, ServiceConfig::default());
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.model_file, "RF.json");
        assert_eq!(cfg.startup_policy, StartupPolicy::FailFast);
        assert_eq!(cfg.bind_addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn overrides_are_read() {
        let cfg = ServiceConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("HOST", "127.0.0.1"),
            ("HF_ACCESS_TOKEN", "hf_abc"),
            ("MODEL_REPO", "org/repo"),
            ("MODEL_FILE", "forest.json"),
            ("MODEL_PATH", "/tmp/forest.json"),
            ("STARTUP_POLICY", "Degrade"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.hf_token.as_deref(), Some("hf_abc"));
        assert_eq!(cfg.repo_id, "org/repo");
        assert_eq!(cfg.model_file, "forest.json");
        assert_eq!(cfg.model_path, Some(PathBuf::from("/tmp/forest.json")));
        assert_eq!(cfg.startup_policy, StartupPolicy::Degrade);
        assert_eq!(cfg.bind_addr().unwrap().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let cfg = ServiceConfig::from_lookup(lookup(&[("HF_ACCESS_TOKEN", "")])).unwrap();
        assert_eq!(cfg.hf_token, None);
    }

    #[test]
    fn bad_values_are_reported() {
        let err = ServiceConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

        let err =
            ServiceConfig::from_lookup(lookup(&[("STARTUP_POLICY", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "STARTUP_POLICY", .. }));
    }
}
