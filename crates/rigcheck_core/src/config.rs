//! Diagnostic run configuration.
//!
//! Configuration lives in an optional `rigcheck.toml`, looked up next to the
//! executable and then in the working directory. Every field has a default,
//! so the tool runs fine with no file at all. Command line flags are applied
//! on top by the caller.

use crate::redact::RedactionConfig;
use crate::scoring::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const CONFIG_FILE: &str = "rigcheck.toml";

/// Run scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Quick mode skips the event log scan and shrinks the disk benchmark.
    #[serde(default)]
    pub quick: bool,

    /// How many collectors may run at once (valid: 1-64)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_collectors: usize,

    /// Ceiling on any collector's own deadline (seconds, valid: 1-300)
    #[serde(default = "default_collector_timeout")]
    pub collector_timeout_secs: u64,

    /// How long to wait for in-flight collectors after cancellation (seconds)
    #[serde(default = "default_cancel_grace")]
    pub cancel_grace_secs: u64,

    /// Whether completed runs are appended to history
    #[serde(default = "default_record_history")]
    pub record_history: bool,
}

fn default_max_concurrent() -> usize {
    num_cpus::get().max(1)
}

fn default_collector_timeout() -> u64 {
    60
}

fn default_cancel_grace() -> u64 {
    2
}

fn default_record_history() -> bool {
    true
}

impl RunSettings {
    /// Clamp max_concurrent_collectors to valid range (1-64)
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrent_collectors.clamp(1, 64)
    }

    /// Clamped per-collector timeout ceiling
    pub fn collector_timeout(&self) -> Duration {
        Duration::from_secs(self.collector_timeout_secs.clamp(1, 300))
    }

    pub fn cancel_grace(&self) -> Duration {
        Duration::from_secs(self.cancel_grace_secs.min(30))
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            quick: false,
            max_concurrent_collectors: default_max_concurrent(),
            collector_timeout_secs: default_collector_timeout(),
            cancel_grace_secs: default_cancel_grace(),
            record_history: default_record_history(),
        }
    }
}

/// Optional overrides for where things live on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory holding history.jsonl; defaults to the per-user data dir
    #[serde(default)]
    pub history_dir: Option<PathBuf>,

    /// External rules file (JSON or YAML)
    #[serde(default)]
    pub rules_file: Option<PathBuf>,

    /// External driver version database
    #[serde(default)]
    pub drivers_db: Option<PathBuf>,
}

/// Complete rigcheck configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagConfig {
    #[serde(default)]
    pub run: RunSettings,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub redaction: RedactionConfig,

    #[serde(default)]
    pub paths: PathSettings,
}

impl DiagConfig {
    /// Load configuration. An explicit path that fails to parse is reported
    /// and replaced with defaults; the default locations are probed quietly.
    pub fn load(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return match Self::read(path) {
                Ok(config) => config,
                Err(reason) => {
                    warn!("config {} ignored: {}", path.display(), reason);
                    Self::default()
                }
            };
        }

        for path in default_config_paths() {
            if !path.exists() {
                continue;
            }
            match Self::read(&path) {
                Ok(config) => {
                    debug!("loaded config from {}", path.display());
                    return config;
                }
                Err(reason) => {
                    warn!("config {} ignored: {}", path.display(), reason);
                }
            }
        }
        Self::default()
    }

    fn read(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        toml::from_str(&content).map_err(|e| e.to_string())
    }
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            paths.push(dir.join(CONFIG_FILE));
        }
    }
    paths.push(PathBuf::from(CONFIG_FILE));
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DiagConfig::default();
        assert!(!config.run.quick);
        assert!(config.run.record_history);
        assert_eq!(config.run.collector_timeout_secs, 60);
        assert_eq!(config.run.cancel_grace_secs, 2);
        assert!(config.run.max_concurrent_collectors >= 1);
        assert!(config.paths.history_dir.is_none());
        assert!(config.redaction.enabled);
    }

    #[test]
    fn test_clamping() {
        let mut run = RunSettings {
            max_concurrent_collectors: 0,
            ..Default::default()
        };
        assert_eq!(run.effective_concurrency(), 1);

        run.max_concurrent_collectors = 500;
        assert_eq!(run.effective_concurrency(), 64);

        run.collector_timeout_secs = 0;
        assert_eq!(run.collector_timeout(), Duration::from_secs(1));
        run.collector_timeout_secs = 900;
        assert_eq!(run.collector_timeout(), Duration::from_secs(300));

        run.cancel_grace_secs = 300;
        assert_eq!(run.cancel_grace(), Duration::from_secs(30));
    }

    #[test]
    fn test_toml_serialization() {
        let config = DiagConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[run]"));
        assert!(toml_str.contains("[scoring]"));
        assert!(toml_str.contains("[redaction]"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rigcheck.toml");
        std::fs::write(
            &path,
            r#"
[run]
quick = true
collector_timeout_secs = 5

[paths]
history_dir = "/tmp/rigcheck-history"
"#,
        )
        .unwrap();

        let config = DiagConfig::load(Some(&path));
        assert!(config.run.quick);
        assert_eq!(config.run.collector_timeout_secs, 5);
        assert!(config.run.record_history);
        assert_eq!(
            config.paths.history_dir.as_deref(),
            Some(Path::new("/tmp/rigcheck-history"))
        );
        assert!(config.redaction.enabled);
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rigcheck.toml");
        std::fs::write(&path, "run = 'not a table").unwrap();

        let config = DiagConfig::load(Some(&path));
        assert!(!config.run.quick);
        assert_eq!(config.run.collector_timeout_secs, 60);
    }
}
