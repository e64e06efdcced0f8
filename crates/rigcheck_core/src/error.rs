//! Error taxonomy for the diagnostic pipeline.
//!
//! Failures are absorbed at the stage where they happen: a broken collector
//! costs one snapshot section, a bad rule definition costs one rule, a
//! history problem costs the trend summary. Each absorbed failure is recorded
//! as a [`RunWarning`] on the final report. Only [`DiagError::Fatal`] aborts
//! a run, and only when no report can be produced at all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stages of a diagnostic run, used for state tracking and to attribute
/// warnings and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Init,
    Collecting,
    Analyzing,
    Scoring,
    Recording,
    Done,
    Failed,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Init => "init",
            RunStage::Collecting => "collecting",
            RunStage::Analyzing => "analyzing",
            RunStage::Scoring => "scoring",
            RunStage::Recording => "recording",
            RunStage::Done => "done",
            RunStage::Failed => "failed",
        }
    }

    /// Whether the run can no longer make progress from this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStage::Done | RunStage::Failed)
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised inside the diagnostic pipeline.
#[derive(Debug, Error)]
pub enum DiagError {
    /// A collector failed, timed out, or was cancelled. The affected section
    /// is recorded as unavailable and the run continues.
    #[error("collector '{name}' failed: {reason}")]
    Collector { name: String, reason: String },

    /// A rule definition could not be parsed or validated. The entry is
    /// skipped; the rest of the rule set still loads.
    #[error("invalid rule definition: {0}")]
    RuleDefinition(String),

    /// The history store could not be read or written. The run completes
    /// without a trend summary.
    #[error("history persistence failed: {0}")]
    Persistence(String),

    /// The pipeline cannot produce a report at all. The only variant that
    /// terminates a run.
    #[error("fatal failure during {stage}: {reason}")]
    Fatal { stage: RunStage, reason: String },
}

impl DiagError {
    pub fn collector(name: impl Into<String>, reason: impl Into<String>) -> Self {
        DiagError::Collector {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn fatal(stage: RunStage, reason: impl Into<String>) -> Self {
        DiagError::Fatal {
            stage,
            reason: reason.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, DiagError::Fatal { .. })
    }
}

/// A non-fatal problem that degraded the run, surfaced on the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunWarning {
    pub stage: RunStage,
    pub message: String,
}

impl RunWarning {
    pub fn new(stage: RunStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}
