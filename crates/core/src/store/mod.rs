//! Versioned score persistence.
//!
//! The store keeps one mutable "current" row per ticker and an
//! append/overwrite history keyed by (ticker, calculation date). The two
//! writes happen in one transaction so the pair can never diverge.

mod model;
pub(crate) mod sqlite;

pub use model::{CurrentScoreRowDb, ScoreRowDb};
pub use sqlite::SqliteScoreStore;

use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::Result;
use crate::scoring::model::{CalculationStatus, ScoreRecord};

/// Per-status tallies for one domain on one calculation date.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StatusCounts {
    pub success: usize,
    pub partial: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: CalculationStatus) {
        match status {
            CalculationStatus::Success => self.success += 1,
            CalculationStatus::Partial => self.partial += 1,
            CalculationStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.partial + self.failed
    }

    /// Fraction of fully successful calculations, 0.0 when empty.
    pub fn success_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.success as f64 / total as f64
        }
    }
}

/// Per-domain tallies for one calculation date, for the status surface.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct DomainStatusCounts {
    pub technical: StatusCounts,
    pub fundamental: StatusCounts,
    pub analyst: StatusCounts,
}

/// Storage interface for score records.
///
/// Writes are short transactions at (ticker) / (ticker, date) grain;
/// no operation takes cross-ticker locks.
pub trait ScoreStore: Send + Sync {
    /// Write `record` to both the current and history tables atomically.
    ///
    /// Current is keyed on ticker alone (latest wins); history is keyed
    /// on (ticker, calculation_date) and same-day reprocessing replaces
    /// in place rather than duplicating.
    fn upsert(&self, record: &ScoreRecord) -> Result<()>;

    /// The current row for a ticker, if any.
    fn get_current(&self, ticker: &str) -> Result<Option<ScoreRecord>>;

    /// History for a ticker, most recent calculation date first.
    fn get_history(&self, ticker: &str) -> Result<Vec<ScoreRecord>>;

    /// Delete history older than `days_to_keep` calendar days counted
    /// back from the most recent calculation date present. Current rows
    /// are never pruned by age. Returns the number of rows deleted.
    fn prune_history(&self, days_to_keep: i64) -> Result<usize>;

    /// Per-domain status tallies for one calculation date.
    fn status_counts(&self, date: NaiveDate) -> Result<DomainStatusCounts>;
}
