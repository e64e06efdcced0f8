//! External rule file loading.
//!
//! Rule files are JSON or YAML (picked by extension), holding either a bare
//! array of rules or an object with a top-level `rules` key. A file that
//! cannot be read or parsed at all is a load error the caller downgrades to
//! a warning; a malformed individual entry is skipped with a warning while
//! the rest of the file still loads.

use super::{Rule, RuleSet};
use crate::error::DiagError;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// Rules that survived loading plus warnings for every entry that did not.
#[derive(Debug, Default)]
pub struct RuleLoadOutcome {
    pub rules: Vec<Rule>,
    pub warnings: Vec<String>,
}

/// Load and validate rules from one file. File-level failures (missing file,
/// unreadable, not valid JSON/YAML, wrong root shape) are errors; entry-level
/// failures are collected as warnings.
pub fn load_rules_file(path: &Path) -> Result<RuleLoadOutcome, DiagError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        DiagError::RuleDefinition(format!("cannot read rules file {}: {}", path.display(), e))
    })?;

    let root: Value = if is_yaml(path) {
        serde_yaml::from_str(&raw).map_err(|e| {
            DiagError::RuleDefinition(format!("invalid YAML in {}: {}", path.display(), e))
        })?
    } else {
        serde_json::from_str(&raw).map_err(|e| {
            DiagError::RuleDefinition(format!("invalid JSON in {}: {}", path.display(), e))
        })?
    };

    let entries = match root {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("rules") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(DiagError::RuleDefinition(format!(
                    "{}: expected an array of rules or an object with a 'rules' array",
                    path.display()
                )))
            }
        },
        _ => {
            return Err(DiagError::RuleDefinition(format!(
                "{}: expected an array of rules or an object with a 'rules' array",
                path.display()
            )))
        }
    };

    let mut outcome = RuleLoadOutcome::default();
    for (position, entry) in entries.into_iter().enumerate() {
        match parse_entry(entry, position) {
            Ok(rule) => outcome.rules.push(rule),
            Err(reason) => {
                warn!("skipping rule in {}: {}", path.display(), reason);
                outcome.warnings.push(reason);
            }
        }
    }

    info!(
        "loaded {} rule(s) from {} ({} skipped)",
        outcome.rules.len(),
        path.display(),
        outcome.warnings.len()
    );
    Ok(outcome)
}

fn parse_entry(entry: Value, position: usize) -> Result<Rule, String> {
    let label = entry
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("entry #{}", position + 1));

    let rule: Rule = serde_json::from_value(entry)
        .map_err(|e| format!("rule '{}' is malformed: {}", label, e))?;
    rule.validate()
        .map_err(|e| format!("rule '{}' is invalid: {}", rule.id, e))?;
    Ok(rule)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Build the effective rule set: built-ins, overlaid with an optional
/// external file. External rules replace built-ins that share an id and
/// append otherwise. Never fails; every problem becomes a warning so the
/// built-in catalog still runs.
pub fn load_ruleset(external: Option<&Path>) -> (RuleSet, Vec<String>) {
    let mut set = RuleSet::builtin();
    let mut warnings = Vec::new();

    if let Some(path) = external {
        match load_rules_file(path) {
            Ok(outcome) => {
                warnings.extend(outcome.warnings);
                set.merge(outcome.rules);
            }
            Err(e) => {
                warn!("rules file ignored: {}", e);
                warnings.push(e.to_string());
            }
        }
    }

    (set, warnings)
}
