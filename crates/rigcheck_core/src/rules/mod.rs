//! Diagnostic rules
//!
//! A rule is data: a condition over snapshot field paths plus the issue to
//! raise when it holds. Built-in rules and rules loaded from an external file
//! share one shape, and after merging the engine cannot tell them apart.
//!
//! Submodules:
//! - [`builtin`] - the shipped rule table
//! - [`load`] - external rule files (JSON or YAML), tolerant per-entry parsing
//! - [`eval`] - evaluation of a rule set against a snapshot

pub mod builtin;
pub mod eval;
pub mod load;

pub use eval::{evaluate, evaluate_tree};
pub use load::{load_rules_file, load_ruleset, RuleLoadOutcome};

use crate::error::DiagError;
use serde::{Deserialize, Serialize};

// ============================================================================
// SEVERITY AND CATEGORY
// ============================================================================

/// How bad a finding is. Drives ordering and score penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Rank for ordering; higher sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What part of the system a finding concerns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Hardware,
    Performance,
    Gaming,
    Network,
    Config,
    Stability,
    Security,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hardware => "hardware",
            Category::Performance => "performance",
            Category::Gaming => "gaming",
            Category::Network => "network",
            Category::Config => "config",
            Category::Stability => "stability",
            Category::Security => "security",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

/// Comparison operators rules may use. A closed set: anything else fails to
/// parse and the rule is rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Contains,
}

impl Operator {
    /// Whether this operator orders numbers (and so requires a numeric
    /// constant).
    pub fn is_ordering(&self) -> bool {
        matches!(self, Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge)
    }
}

/// One field comparison. `field` is a dotted path into the snapshot; a `*`
/// segment matches any element of an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub field: String,
    pub op: Operator,
    pub value: serde_json::Value,
}

/// Rule condition: a comparison, or a combinator over sub-conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Predicate {
    All { all: Vec<Predicate> },
    Any { any: Vec<Predicate> },
    Compare(Comparison),
}

impl Predicate {
    /// The single comparison, when this predicate is exactly one.
    pub fn as_single_comparison(&self) -> Option<&Comparison> {
        match self {
            Predicate::Compare(cmp) => Some(cmp),
            _ => None,
        }
    }
}

// ============================================================================
// RULES
// ============================================================================

fn default_confidence() -> u8 {
    100
}

fn default_enabled() -> bool {
    true
}

/// A diagnostic rule. `message` and `recommendation` are templates that may
/// reference `{value}` (the first piece of evidence) and `{field}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    /// 0-100: how often this finding is actionable when it fires
    #[serde(default = "default_confidence")]
    pub confidence: u8,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub recommendation: String,
    pub when: Predicate,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Rule {
    /// Check invariants a parsed rule must satisfy before it may run.
    pub fn validate(&self) -> Result<(), DiagError> {
        if self.id.trim().is_empty() {
            return Err(DiagError::RuleDefinition("rule id is empty".into()));
        }
        if self.title.trim().is_empty() {
            return Err(DiagError::RuleDefinition(format!(
                "rule '{}' has an empty title",
                self.id
            )));
        }
        if self.confidence > 100 {
            return Err(DiagError::RuleDefinition(format!(
                "rule '{}' has confidence {} (max 100)",
                self.id, self.confidence
            )));
        }
        validate_predicate(&self.id, &self.when)
    }
}

fn validate_predicate(rule_id: &str, predicate: &Predicate) -> Result<(), DiagError> {
    match predicate {
        Predicate::All { all } | Predicate::Any { any: all } => {
            if all.is_empty() {
                return Err(DiagError::RuleDefinition(format!(
                    "rule '{}' has an empty combinator",
                    rule_id
                )));
            }
            for child in all {
                validate_predicate(rule_id, child)?;
            }
            Ok(())
        }
        Predicate::Compare(cmp) => {
            if cmp.field.trim().is_empty() {
                return Err(DiagError::RuleDefinition(format!(
                    "rule '{}' compares an empty field path",
                    rule_id
                )));
            }
            if cmp.op.is_ordering() && !cmp.value.is_number() {
                return Err(DiagError::RuleDefinition(format!(
                    "rule '{}' orders field '{}' against a non-numeric constant",
                    rule_id, cmp.field
                )));
            }
            if cmp.op == Operator::In && !cmp.value.is_array() {
                return Err(DiagError::RuleDefinition(format!(
                    "rule '{}' uses 'in' with a non-array constant",
                    rule_id
                )));
            }
            Ok(())
        }
    }
}

// ============================================================================
// EVIDENCE AND ISSUES
// ============================================================================

/// One resolved snapshot value that satisfied a comparison, with the concrete
/// path it was found at (wildcards replaced by real indexes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub field: String,
    pub value: serde_json::Value,
}

/// A finding produced by one firing rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub rule_id: String,
    pub category: Category,
    pub severity: Severity,
    pub confidence: u8,
    pub title: String,
    pub description: String,
    pub evidence: Vec<Evidence>,
    pub recommendation: String,
}

// ============================================================================
// RULE SET
// ============================================================================

/// An ordered collection of rules with id-based override semantics.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// The shipped rule table.
    pub fn builtin() -> Self {
        Self {
            rules: builtin::builtin_rules(),
        }
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Merge rules in: an incoming rule whose id already exists replaces the
    /// existing one in place (keeping its position), anything else appends.
    /// Last merged wins.
    pub fn merge(&mut self, incoming: Vec<Rule>) {
        for rule in incoming {
            match self.rules.iter().position(|r| r.id == rule.id) {
                Some(pos) => self.rules[pos] = rule,
                None => self.rules.push(rule),
            }
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Enabled rules with their declaration index, in declaration order.
    pub fn enabled(&self) -> impl Iterator<Item = (usize, &Rule)> {
        self.rules.iter().enumerate().filter(|(_, r)| r.enabled)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }
}
