use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::Serialize;

/// `[start, end)` interval of audit records requested by one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of length `span` ending at `now`, truncated to whole seconds.
    /// `span` must be positive; configuration validation guarantees it.
    pub fn ending_at(now: DateTime<Utc>, span: Duration) -> Self {
        let end = now.trunc_subsecs(0);
        Self { start: end - span, end }
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    pub fn from_param(&self) -> String {
        format_iso8601(self.start)
    }

    pub fn to_param(&self) -> String {
        format_iso8601(self.end)
    }
}

/// ISO-8601 UTC with second precision and a trailing `Z`
pub fn format_iso8601(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
