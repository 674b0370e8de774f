//! Destinations that durably record one metrics row per run.
//!
//! Every sink exposes the same contract: `append(row) -> bool`. Failures are
//! logged at the sink boundary and never propagate, so a bad day for one
//! destination does not stop the rest of the daily run.

pub mod local;
pub mod sheet;

pub use local::LocalFileSink;
pub use sheet::RemoteSheetSink;

use crate::error::{GrowthError, SinkError};
use crate::row::{DateFormat, MetricsRow};
use serde::{Deserialize, Serialize};

pub trait MetricsSink {
    fn name(&self) -> &'static str;

    /// Date rendering used for rows written to this destination.
    fn date_format(&self) -> DateFormat;

    fn try_append(&self, row: &MetricsRow) -> Result<(), SinkError>;

    /// Append one row. Returns false on any failure after logging it.
    fn append(&self, row: &MetricsRow) -> bool {
        match self.try_append(row) {
            Ok(()) => {
                tracing::info!(sink = self.name(), query = %row.query, "metrics row appended");
                true
            }
            Err(e) => {
                tracing::error!(sink = self.name(), error = %e, "failed to append metrics row");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SinkChoice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkChoice {
    /// Remote spreadsheet when configured, local file as the fallback.
    #[default]
    Auto,
    Remote,
    Local,
}

impl std::fmt::Display for SinkChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkChoice::Auto => write!(f, "auto"),
            SinkChoice::Remote => write!(f, "remote"),
            SinkChoice::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for SinkChoice {
    type Err = GrowthError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(SinkChoice::Auto),
            "remote" => Ok(SinkChoice::Remote),
            "local" => Ok(SinkChoice::Local),
            _ => Err(GrowthError::InvalidSinkChoice(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Recording with fallback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    /// Name of the sink that stored the row, if any did.
    pub sink: Option<&'static str>,
    pub fell_back: bool,
}

impl RecordOutcome {
    pub fn recorded(&self) -> bool {
        self.sink.is_some()
    }
}

/// Append `row` to `primary`; only when that reports a failure, try
/// `fallback`. A failure the primary reports after it already stored the
/// row (a timeout on the response, say) leaves the row in both sinks; see
/// the note on [`RemoteSheetSink`] about the missing dedup key.
pub fn record_row(
    row: &MetricsRow,
    primary: &dyn MetricsSink,
    fallback: Option<&dyn MetricsSink>,
) -> RecordOutcome {
    if primary.append(row) {
        return RecordOutcome {
            sink: Some(primary.name()),
            fell_back: false,
        };
    }
    let Some(fallback) = fallback else {
        return RecordOutcome {
            sink: None,
            fell_back: false,
        };
    };
    tracing::warn!(
        primary = primary.name(),
        fallback = fallback.name(),
        "primary sink failed, falling back"
    );
    let stored = fallback.append(row);
    RecordOutcome {
        sink: stored.then(|| fallback.name()),
        fell_back: true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::MetricsRowBuilder;
    use chrono::NaiveDate;
    use std::cell::RefCell;

    struct MemorySink {
        name: &'static str,
        fail: bool,
        rows: RefCell<Vec<Vec<String>>>,
    }

    impl MemorySink {
        fn new(name: &'static str, fail: bool) -> Self {
            Self {
                name,
                fail,
                rows: RefCell::new(Vec::new()),
            }
        }
    }

    impl MetricsSink for MemorySink {
        fn name(&self) -> &'static str {
            self.name
        }

        fn date_format(&self) -> DateFormat {
            DateFormat::Short
        }

        fn try_append(&self, row: &MetricsRow) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Transport("unreachable".to_string()));
            }
            self.rows.borrow_mut().push(row.to_strings(self.date_format()));
            Ok(())
        }
    }

    /// Stores the row, then reports the failure a lost response would give.
    struct LostResponseSink {
        rows: RefCell<Vec<Vec<String>>>,
    }

    impl MetricsSink for LostResponseSink {
        fn name(&self) -> &'static str {
            "lossy"
        }

        fn date_format(&self) -> DateFormat {
            DateFormat::Short
        }

        fn try_append(&self, row: &MetricsRow) -> Result<(), SinkError> {
            self.rows.borrow_mut().push(row.to_strings(self.date_format()));
            Err(SinkError::Transport("timed out waiting for response".to_string()))
        }
    }

    fn row() -> MetricsRow {
        MetricsRowBuilder::new("q").build(NaiveDate::from_ymd_opt(2025, 5, 29).unwrap())
    }

    #[test]
    fn append_maps_error_to_false() {
        let sink = MemorySink::new("broken", true);
        assert!(!sink.append(&row()));
    }

    #[test]
    fn primary_success_skips_fallback() {
        let primary = MemorySink::new("primary", false);
        let fallback = MemorySink::new("fallback", false);
        let outcome = record_row(&row(), &primary, Some(&fallback));
        assert_eq!(outcome.sink, Some("primary"));
        assert!(!outcome.fell_back);
        assert_eq!(primary.rows.borrow().len(), 1);
        assert!(fallback.rows.borrow().is_empty());
    }

    #[test]
    fn primary_failure_uses_fallback() {
        let primary = MemorySink::new("primary", true);
        let fallback = MemorySink::new("fallback", false);
        let outcome = record_row(&row(), &primary, Some(&fallback));
        assert_eq!(outcome.sink, Some("fallback"));
        assert!(outcome.fell_back);
        assert_eq!(fallback.rows.borrow().len(), 1);
    }

    #[test]
    fn both_failing_records_nothing() {
        let primary = MemorySink::new("primary", true);
        let fallback = MemorySink::new("fallback", true);
        let outcome = record_row(&row(), &primary, Some(&fallback));
        assert!(!outcome.recorded());
        assert!(outcome.fell_back);

        let outcome = record_row(&row(), &primary, None);
        assert!(!outcome.recorded());
        assert!(!outcome.fell_back);
    }

    #[test]
    fn reported_failure_after_store_lands_in_both_sinks() {
        let primary = LostResponseSink {
            rows: RefCell::new(Vec::new()),
        };
        let fallback = MemorySink::new("fallback", false);
        let outcome = record_row(&row(), &primary, Some(&fallback));
        assert_eq!(outcome.sink, Some("fallback"));
        assert!(outcome.fell_back);
        assert_eq!(primary.rows.borrow().len(), 1);
        assert_eq!(fallback.rows.borrow().len(), 1);
    }

    #[test]
    fn sink_choice_parse() {
        assert_eq!("remote".parse::<SinkChoice>().unwrap(), SinkChoice::Remote);
        assert_eq!(SinkChoice::default().to_string(), "auto");
        assert!("sheets".parse::<SinkChoice>().is_err());
    }
}
