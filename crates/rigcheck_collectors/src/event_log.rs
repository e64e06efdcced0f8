//! Windows event log probe.
//!
//! Counts the last week of System and Application log noise through
//! `wevtutil` XPath queries: critical and error levels, application crashes,
//! and Kernel-Power 41 hard resets. The scan reads thousands of records, so
//! quick mode skips it entirely.

use crate::probe;
use rigcheck_core::snapshot::EventLogSummary;
use rigcheck_core::{Collector, CollectorContext, DiagError, SectionData, SectionKind};
use std::time::Duration;

const PERIOD_DAYS: u32 = 7;
const PERIOD_MS: u64 = PERIOD_DAYS as u64 * 86_400_000;

/// Counting past this many matches per query adds nothing to the verdict.
const QUERY_CAP: u32 = 2000;

pub struct EventLogCollector;

impl Collector for EventLogCollector {
    fn name(&self) -> &'static str {
        "event_log"
    }

    fn kind(&self) -> SectionKind {
        SectionKind::EventLog
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    fn skip_reason(&self, ctx: &CollectorContext) -> Option<String> {
        if ctx.quick {
            Some("event log scan skipped in quick mode".to_string())
        } else {
            None
        }
    }

    fn collect(&self, ctx: &CollectorContext) -> Result<SectionData, DiagError> {
        let critical = count_events("System", &level_query(1));
        let errors = count_events("System", &level_query(2));
        let warnings = count_events("System", &level_query(3));

        if ctx.cancel.is_cancelled() {
            return Err(DiagError::collector(self.name(), "cancelled"));
        }

        let crashes = count_events(
            "Application",
            &event_id_query(1000, Some("Application Error")),
        );
        let shutdowns = count_events("System", &event_id_query(41, None));

        if [critical, errors, warnings, crashes, shutdowns]
            .iter()
            .all(Option::is_none)
        {
            return Err(DiagError::collector(
                self.name(),
                "event log queries require wevtutil",
            ));
        }

        Ok(SectionData::EventLog(build_summary(
            critical.unwrap_or(0),
            errors.unwrap_or(0),
            warnings.unwrap_or(0),
            crashes.unwrap_or(0),
            shutdowns.unwrap_or(0),
        )))
    }
}

fn level_query(level: u8) -> String {
    format!(
        "*[System[(Level={}) and TimeCreated[timediff(@SystemTime) <= {}]]]",
        level, PERIOD_MS
    )
}

fn event_id_query(event_id: u32, provider: Option<&str>) -> String {
    match provider {
        Some(name) => format!(
            "*[System[Provider[@Name='{}'] and (EventID={}) and TimeCreated[timediff(@SystemTime) <= {}]]]",
            name, event_id, PERIOD_MS
        ),
        None => format!(
            "*[System[(EventID={}) and TimeCreated[timediff(@SystemTime) <= {}]]]",
            event_id, PERIOD_MS
        ),
    }
}

/// Count matches for one XPath query against one log. `None` means the tool
/// itself was unavailable, not that nothing matched.
fn count_events(log: &str, query: &str) -> Option<u64> {
    let raw = probe::command(
        "wevtutil",
        &[
            "qe",
            log,
            &format!("/q:{}", query),
            &format!("/c:{}", QUERY_CAP),
            "/f:xml",
        ],
    )?;
    Some(count_event_elements(&raw))
}

fn count_event_elements(xml: &str) -> u64 {
    (xml.matches("<Event ").count() + xml.matches("<Event>").count()) as u64
}

fn build_summary(
    critical: u64,
    errors: u64,
    warnings: u64,
    crashes: u64,
    shutdowns: u64,
) -> EventLogSummary {
    EventLogSummary {
        period_days: PERIOD_DAYS,
        total_events: critical + errors + warnings + crashes,
        critical_errors: critical,
        error_count: errors,
        warning_count: warnings,
        app_crashes: crashes,
        unexpected_shutdowns: shutdowns,
    }
}
