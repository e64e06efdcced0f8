//! Shared engine for the rigcheck diagnostic tool.
//!
//! Holds everything the binary and the collectors agree on: the snapshot
//! schema, the rule engine, scoring, history, redaction, and the run
//! orchestrator. Collecting actual system data lives in the collectors
//! crate; rendering lives in the binary.

pub mod collector;
pub mod config;
pub mod drivers_db;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod redact;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod snapshot;

pub use collector::{CancelToken, Collector, CollectorContext, SectionData, SectionKind};
pub use config::DiagConfig;
pub use error::{DiagError, RunStage, RunWarning};
pub use history::{HistoryEntry, HistoryStore, TrendSummary};
pub use orchestrator::Orchestrator;
pub use report::RunReport;
pub use rules::{Category, Issue, Rule, RuleSet, Severity};
pub use scoring::{HealthLabel, HealthScore, ScoringConfig};
pub use snapshot::{Section, Snapshot};
