//! Rule evaluation against a snapshot.
//!
//! Field paths resolve against the snapshot's field tree, where absent
//! sections simply do not exist. A comparison whose path resolves to nothing
//! (missing section, missing field, or a null optional) is unsatisfied and
//! the rule silently does not fire; missing data is never an error here.
//!
//! When several single-comparison rules watch the same numeric field in the
//! same direction and fire together, only the narrowest threshold survives:
//! the smallest cutoff for below-style rules (lt/le), the largest for
//! above-style rules (gt/ge). Rules with compound conditions are never
//! deduplicated.

use super::{Comparison, Evidence, Issue, Operator, Predicate, Rule, RuleSet};
use crate::snapshot::Snapshot;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Evaluate all enabled rules against a snapshot, returning issues ordered by
/// severity, then confidence, then rule declaration order.
pub fn evaluate(snapshot: &Snapshot, rules: &RuleSet) -> Vec<Issue> {
    evaluate_tree(&snapshot.field_tree(), rules)
}

/// Evaluation against a pre-built field tree. Split out so tests can shape
/// trees directly.
pub fn evaluate_tree(tree: &Value, rules: &RuleSet) -> Vec<Issue> {
    let mut fired: Vec<Firing> = Vec::new();
    for (index, rule) in rules.enabled() {
        if let Some(evidence) = eval_predicate(tree, &rule.when) {
            fired.push(Firing {
                index,
                rule,
                evidence,
            });
        }
    }

    drop_shadowed_thresholds(&mut fired);

    fired.sort_by(|a, b| {
        b.rule
            .severity
            .rank()
            .cmp(&a.rule.severity.rank())
            .then(b.rule.confidence.cmp(&a.rule.confidence))
            .then(a.index.cmp(&b.index))
    });

    fired.into_iter().map(Firing::into_issue).collect()
}

struct Firing<'a> {
    index: usize,
    rule: &'a Rule,
    evidence: Vec<Evidence>,
}

impl Firing<'_> {
    fn into_issue(self) -> Issue {
        Issue {
            rule_id: self.rule.id.clone(),
            category: self.rule.category,
            severity: self.rule.severity,
            confidence: self.rule.confidence,
            title: self.rule.title.clone(),
            description: render_template(&self.rule.message, &self.evidence),
            recommendation: render_template(&self.rule.recommendation, &self.evidence),
            evidence: self.evidence,
        }
    }
}

// ============================================================================
// PREDICATE EVALUATION
// ============================================================================

fn eval_predicate(tree: &Value, predicate: &Predicate) -> Option<Vec<Evidence>> {
    match predicate {
        Predicate::Compare(cmp) => eval_comparison(tree, cmp),
        Predicate::All { all } => {
            let mut evidence = Vec::new();
            for child in all {
                evidence.extend(eval_predicate(tree, child)?);
            }
            Some(evidence)
        }
        Predicate::Any { any } => {
            let mut evidence = Vec::new();
            for child in any {
                if let Some(satisfied) = eval_predicate(tree, child) {
                    evidence.extend(satisfied);
                }
            }
            if evidence.is_empty() {
                None
            } else {
                Some(evidence)
            }
        }
    }
}

fn eval_comparison(tree: &Value, cmp: &Comparison) -> Option<Vec<Evidence>> {
    let satisfying: Vec<Evidence> = resolve_path(tree, &cmp.field)
        .into_iter()
        .filter(|(_, value)| compare(cmp.op, value, &cmp.value))
        .map(|(path, value)| Evidence { field: path, value })
        .collect();

    if satisfying.is_empty() {
        None
    } else {
        Some(satisfying)
    }
}

/// Resolve a dotted path to every value it names. A `*` segment fans out over
/// all elements of an array (any-element semantics); a numeric segment
/// indexes one. Nulls are dropped: a serialized `None` counts as absent.
fn resolve_path(tree: &Value, path: &str) -> Vec<(String, Value)> {
    let mut current: Vec<(String, &Value)> = vec![(String::new(), tree)];

    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let mut next = Vec::new();
        for (prefix, node) in current {
            if segment == "*" {
                if let Value::Array(arr) = node {
                    for (i, elem) in arr.iter().enumerate() {
                        next.push((join(&prefix, &i.to_string()), elem));
                    }
                }
            } else {
                match node {
                    Value::Object(map) => {
                        if let Some(value) = map.get(segment) {
                            next.push((join(&prefix, segment), value));
                        }
                    }
                    Value::Array(arr) => {
                        if let Some(value) = segment.parse::<usize>().ok().and_then(|i| arr.get(i))
                        {
                            next.push((join(&prefix, segment), value));
                        }
                    }
                    _ => {}
                }
            }
        }
        current = next;
        if current.is_empty() {
            break;
        }
    }

    current
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(path, value)| (path, value.clone()))
        .collect()
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

// ============================================================================
// OPERATORS
// ============================================================================

fn compare(op: Operator, actual: &Value, expected: &Value) -> bool {
    match op {
        Operator::Equals => values_equal(actual, expected),
        Operator::NotEquals => !values_equal(actual, expected),
        Operator::Lt => ordered(actual, expected, |a, b| a < b),
        Operator::Le => ordered(actual, expected, |a, b| a <= b),
        Operator::Gt => ordered(actual, expected, |a, b| a > b),
        Operator::Ge => ordered(actual, expected, |a, b| a >= b),
        Operator::In => expected
            .as_array()
            .map(|arr| arr.iter().any(|candidate| values_equal(actual, candidate)))
            .unwrap_or(false),
        Operator::Contains => match (actual, expected) {
            (Value::String(haystack), Value::String(needle)) => {
                haystack.to_lowercase().contains(&needle.to_lowercase())
            }
            (Value::Array(arr), needle) => arr.iter().any(|elem| values_equal(elem, needle)),
            _ => false,
        },
    }
}

fn ordered(actual: &Value, expected: &Value, satisfied: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => satisfied(a, b),
        _ => false,
    }
}

/// Equality with integer/float coercion, so `16` and `16.0` agree.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

// ============================================================================
// THRESHOLD OVERLAP POLICY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Below,
    Above,
}

struct ThresholdFiring {
    position: usize,
    cutoff: f64,
    severity_rank: u8,
    index: usize,
}

fn drop_shadowed_thresholds(fired: &mut Vec<Firing>) {
    let mut groups: HashMap<(String, Direction), Vec<ThresholdFiring>> = HashMap::new();

    for (position, firing) in fired.iter().enumerate() {
        let Some(cmp) = firing.rule.when.as_single_comparison() else {
            continue;
        };
        if !cmp.op.is_ordering() {
            continue;
        }
        let Some(cutoff) = cmp.value.as_f64() else {
            continue;
        };
        let direction = match cmp.op {
            Operator::Lt | Operator::Le => Direction::Below,
            _ => Direction::Above,
        };
        groups
            .entry((cmp.field.clone(), direction))
            .or_default()
            .push(ThresholdFiring {
                position,
                cutoff,
                severity_rank: firing.rule.severity.rank(),
                index: firing.index,
            });
    }

    let mut shadowed: HashSet<usize> = HashSet::new();
    for ((field, direction), mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        members.sort_by(|a, b| {
            let narrower = match direction {
                Direction::Below => a.cutoff.partial_cmp(&b.cutoff),
                Direction::Above => b.cutoff.partial_cmp(&a.cutoff),
            }
            .unwrap_or(Ordering::Equal);
            narrower
                .then(b.severity_rank.cmp(&a.severity_rank))
                .then(a.index.cmp(&b.index))
        });
        debug!(
            "overlapping thresholds on '{}': keeping '{}', dropping {}",
            field,
            fired[members[0].position].rule.id,
            members.len() - 1
        );
        for loser in &members[1..] {
            shadowed.insert(loser.position);
        }
    }

    if !shadowed.is_empty() {
        let mut position = 0;
        fired.retain(|_| {
            let keep = !shadowed.contains(&position);
            position += 1;
            keep
        });
    }
}

// ============================================================================
// TEMPLATES
// ============================================================================

/// Substitute `{value}` (first evidence value) and `{field}` (its path).
fn render_template(template: &str, evidence: &[Evidence]) -> String {
    let Some(first) = evidence.first() else {
        return template.to_string();
    };
    template
        .replace("{value}", &display_value(&first.value))
        .replace("{field}", &first.field)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
