//! Snapshot redaction
//!
//! Strips machine-identifying data from snapshots before they are written to
//! disk, rendered, or hashed into history:
//! - Account names inside user-profile paths (`C:\Users\<name>`, `/home/<name>`)
//! - The current OS username wherever it appears in string values
//! - MAC addresses
//! - Values of serial-number-like keys
//! - Field paths collectors flagged as sensitive
//!
//! Redaction is pure and idempotent: it returns a new snapshot, applying it
//! twice yields the first result, and it never fails. If the snapshot cannot
//! be rewritten for any reason the original is returned unchanged rather than
//! blocking the run.

use crate::snapshot::Snapshot;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::warn;

/// The one placeholder every redacted value becomes. Fixed so that repeated
/// redaction reaches a fixed point.
pub const REDACTED: &str = "[REDACTED]";

// ============================================================================
// CONFIGURATION
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_sensitive_keys() -> Vec<String> {
    vec![
        "serial".to_string(),
        "serial_number".to_string(),
        "uuid".to_string(),
        "device_id".to_string(),
    ]
}

/// What the redactor targets. All fields have working defaults.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RedactionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Object keys whose string values are always replaced
    #[serde(default = "default_sensitive_keys")]
    pub sensitive_keys: Vec<String>,
    /// Also scrub bare occurrences of the current OS username
    #[serde(default = "default_true")]
    pub scrub_username: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sensitive_keys: default_sensitive_keys(),
            scrub_username: default_true(),
        }
    }
}

// ============================================================================
// COMPILED PATTERNS
// ============================================================================

struct ScrubPattern {
    regex: Regex,
    /// Keep capture group 1 as a prefix (path scrubs) instead of replacing
    /// the whole match
    keep_prefix: bool,
}

impl ScrubPattern {
    fn new(pattern: &str, keep_prefix: bool) -> Option<Self> {
        Regex::new(pattern)
            .ok()
            .map(|regex| Self { regex, keep_prefix })
    }

    fn apply(&self, text: &str) -> String {
        if self.keep_prefix {
            self.regex
                .replace_all(text, |caps: &regex::Captures| {
                    format!("{}{}", caps.get(1).map(|m| m.as_str()).unwrap_or(""), REDACTED)
                })
                .to_string()
        } else {
            self.regex.replace_all(text, REDACTED).to_string()
        }
    }
}

static SCRUB_PATTERNS: LazyLock<Vec<ScrubPattern>> = LazyLock::new(|| {
    let patterns: Vec<(&str, bool)> = vec![
        // Windows user-profile paths, both slash styles
        (r"(?i)([A-Za-z]:\\Users\\)([^\\/\s]+)", true),
        (r"(?i)([A-Za-z]:/Users/)([^/\s]+)", true),
        // Unix and macOS home directories
        (r"(/home/)([^/\s]+)", true),
        (r"(/Users/)([^/\s]+)", true),
        // MAC addresses
        (r"\b[0-9A-Fa-f]{2}([:-][0-9A-Fa-f]{2}){5}\b", false),
    ];

    patterns
        .into_iter()
        .filter_map(|(p, keep)| ScrubPattern::new(p, keep))
        .collect()
});

// ============================================================================
// REDACTOR
// ============================================================================

/// Applies the redaction policy to snapshots and to loose text.
pub struct Redactor {
    enabled: bool,
    /// Lowercased sensitive key names
    sensitive_keys: Vec<String>,
    username: Option<Regex>,
}

impl Redactor {
    pub fn new() -> Self {
        Self::from_config(&RedactionConfig::default())
    }

    pub fn from_config(config: &RedactionConfig) -> Self {
        let username = if config.scrub_username {
            current_username().and_then(|name| username_regex(&name))
        } else {
            None
        };

        Self {
            enabled: config.enabled,
            sensitive_keys: config
                .sensitive_keys
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            username,
        }
    }

    /// Override the detected OS username. Used by tests.
    pub fn with_username(mut self, name: Option<&str>) -> Self {
        self.username = name.and_then(username_regex);
        self
    }

    /// Produce a redacted copy of the snapshot. Never fails; on any internal
    /// problem the input is returned unchanged.
    pub fn redact(&self, snapshot: &Snapshot) -> Snapshot {
        if !self.enabled {
            return snapshot.clone();
        }

        let mut tree = match serde_json::to_value(snapshot) {
            Ok(tree) => tree,
            Err(e) => {
                warn!("redaction skipped, snapshot did not serialize: {}", e);
                return snapshot.clone();
            }
        };

        for path in &snapshot.sensitive_paths {
            blank_path(&mut tree, path);
        }

        let scrubbed = self.scrub_value(None, &tree);

        match serde_json::from_value(scrubbed) {
            Ok(redacted) => redacted,
            Err(e) => {
                warn!("redacted snapshot did not deserialize, keeping original: {}", e);
                snapshot.clone()
            }
        }
    }

    /// Scrub one string with the pattern table and the username rule.
    pub fn scrub_text(&self, text: &str) -> String {
        let mut result = text.to_string();
        for pattern in SCRUB_PATTERNS.iter() {
            result = pattern.apply(&result);
        }
        if let Some(re) = &self.username {
            result = re.replace_all(&result, REDACTED).to_string();
        }
        result
    }

    fn is_sensitive_key(&self, key: &str) -> bool {
        let lower = key.to_lowercase();
        self.sensitive_keys.iter().any(|k| *k == lower)
    }

    fn scrub_value(&self, key: Option<&str>, value: &Value) -> Value {
        match value {
            Value::String(s) => {
                if key.map(|k| self.is_sensitive_key(k)).unwrap_or(false) {
                    return Value::String(REDACTED.to_string());
                }
                Value::String(self.scrub_text(s))
            }
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.scrub_value(Some(k), v));
                }
                Value::Object(out)
            }
            // Elements inherit the key of the array they sit in, so a list
            // under a sensitive key is blanked element by element.
            Value::Array(arr) => {
                Value::Array(arr.iter().map(|v| self.scrub_value(key, v)).collect())
            }
            other => other.clone(),
        }
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

/// Redact with the default configuration.
pub fn redact_snapshot(snapshot: &Snapshot) -> Snapshot {
    Redactor::new().redact(snapshot)
}

fn current_username() -> Option<String> {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .ok()
        .filter(|name| !name.trim().is_empty())
}

fn username_regex(name: &str) -> Option<Regex> {
    // Very short names would shred unrelated text.
    if name.len() < 3 {
        return None;
    }
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))).ok()
}

/// Walk a dotted field path and replace every string under it with the
/// placeholder. Section envelopes ({state, data}) are descended transparently
/// so paths read the way rules read them.
fn blank_path(root: &mut Value, path: &str) {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return;
    }

    let mut cursor = root;
    for (i, segment) in segments.iter().enumerate() {
        loop {
            let is_envelope = cursor.get("state").is_some() && cursor.get("data").is_some();
            if !is_envelope {
                break;
            }
            match cursor.get_mut("data") {
                Some(inner) => cursor = inner,
                None => return,
            }
        }

        let next = match cursor {
            Value::Object(map) => map.get_mut(*segment),
            Value::Array(arr) => segment.parse::<usize>().ok().and_then(|idx| arr.get_mut(idx)),
            _ => None,
        };

        match next {
            Some(value) if i + 1 == segments.len() => {
                blank_strings(value);
                return;
            }
            Some(value) => cursor = value,
            None => return,
        }
    }
}

fn blank_strings(value: &mut Value) {
    match value {
        Value::String(s) => *s = REDACTED.to_string(),
        Value::Array(arr) => arr.iter_mut().for_each(blank_strings),
        Value::Object(map) => map.values_mut().for_each(blank_strings),
        _ => {}
    }
}
