//! Scoring run orchestration.
//!
//! Coordinates the three domain computers across a prioritized ticker
//! queue:
//!
//! ```text
//! ScoreOrchestrator
//!       │
//!       ├─► RawInputStore   (already-persisted indicator/ratio/analyst rows)
//!       ├─► EarningsCalendar (queue prioritization)
//!       └─► ScoreStore       (current + history upserts)
//! ```
//!
//! Work fans out over a semaphore-bounded pool. The wall-clock budget is
//! cooperative: it is checked before each dispatch, never mid-unit, so a
//! run can overshoot by at most one unit's worst case.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use super::inputs::{EarningsCalendar, RawInputStore};
use super::model::{
    AnalystPartial, FundamentalPartial, ScoreRecord, TechnicalPartial, TickerOutcome,
};
use super::{analyst, fundamental, technical};
use crate::errors::Result;
use crate::store::ScoreStore;

/// Lifecycle of one scoring run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    InProgress,
    Completed,
    /// The time budget expired before the queue drained. Units already
    /// started were allowed to finish.
    TimedOut,
}

/// Aggregate result of one scoring run.
///
/// A run always completes with a summary, even under partial failure;
/// per-ticker problems are enumerated in `errors`, never swallowed.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub state: RunState,
    /// Tickers taken from the queue after prioritization and capping.
    pub requested: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    pub skipped: usize,
    pub elapsed: Duration,
    /// (ticker, message) pairs for every domain or store failure.
    pub errors: Vec<(String, String)>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            state: RunState::Pending,
            requested: 0,
            succeeded: 0,
            partial: 0,
            failed: 0,
            skipped: 0,
            elapsed: Duration::ZERO,
            errors: Vec::new(),
        }
    }

    fn record(&mut self, ticker: &str, report: TickerReport) {
        match report.outcome {
            TickerOutcome::Succeeded => self.succeeded += 1,
            TickerOutcome::Partial => self.partial += 1,
            TickerOutcome::Failed => self.failed += 1,
        }
        for message in report.errors {
            self.errors.push((ticker.to_string(), message));
        }
    }
}

/// Orchestrator behavior knobs.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Width of the worker pool.
    pub max_workers: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { max_workers: 4 }
    }
}

/// Outcome of one ticker work unit.
struct TickerReport {
    outcome: TickerOutcome,
    errors: Vec<String>,
}

/// Coordinates score computation across the ticker universe.
pub struct ScoreOrchestrator<S, R, E>
where
    S: ScoreStore,
    R: RawInputStore,
    E: EarningsCalendar,
{
    store: Arc<S>,
    inputs: Arc<R>,
    earnings: Arc<E>,
    config: OrchestratorConfig,
}

impl<S, R, E> ScoreOrchestrator<S, R, E>
where
    S: ScoreStore + 'static,
    R: RawInputStore + 'static,
    E: EarningsCalendar + 'static,
{
    pub fn new(
        store: Arc<S>,
        inputs: Arc<R>,
        earnings: Arc<E>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            inputs,
            earnings,
            config,
        }
    }

    /// Run daily scoring over the prioritized ticker queue.
    ///
    /// `max_tickers == 0` means no cap. With `force_recalculate == false`,
    /// tickers whose current record for today already has all three
    /// domains successful are skipped.
    pub async fn run(
        &self,
        max_tickers: usize,
        time_budget: Duration,
        force_recalculate: bool,
    ) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::new();
        summary.state = RunState::InProgress;
        let today = Utc::now().date_naive();

        let tickers = match self.inputs.tickers() {
            Ok(tickers) => tickers,
            Err(e) => {
                error!("Failed to list ticker universe: {}", e);
                summary.state = RunState::Completed;
                summary
                    .errors
                    .push(("*".to_string(), format!("failed to list tickers: {}", e)));
                summary.elapsed = started.elapsed();
                return summary;
            }
        };

        let queue = self.prioritized_queue(tickers, max_tickers);
        summary.requested = queue.len();
        info!(
            "Starting scoring run: {} tickers, budget {:?}, force={}",
            queue.len(),
            time_budget,
            force_recalculate
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let mut handles = Vec::with_capacity(queue.len());

        for ticker in queue {
            // Cooperative cancellation: checked between units only.
            if started.elapsed() >= time_budget {
                info!("Time budget reached, no new work dispatched");
                summary.state = RunState::TimedOut;
                break;
            }

            if !force_recalculate && self.already_scored(&ticker, today) {
                debug!("Skipping {} - already scored today", ticker);
                summary.skipped += 1;
                continue;
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .expect("semaphore never closed");
            let store = Arc::clone(&self.store);
            let inputs = Arc::clone(&self.inputs);

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let report = compute_and_store(store.as_ref(), inputs.as_ref(), &ticker, today);
                (ticker, report)
            }));
        }

        // Units already started are allowed to finish.
        for joined in join_all(handles).await {
            match joined {
                Ok((ticker, report)) => summary.record(&ticker, report),
                Err(e) => {
                    warn!("Ticker work unit panicked: {}", e);
                    summary.failed += 1;
                    summary
                        .errors
                        .push(("unknown".to_string(), format!("work unit panicked: {}", e)));
                }
            }
        }

        if summary.state != RunState::TimedOut {
            summary.state = RunState::Completed;
        }
        summary.elapsed = started.elapsed();
        info!(
            "Scoring run {:?}: {} succeeded, {} partial, {} failed, {} skipped in {:?}",
            summary.state,
            summary.succeeded,
            summary.partial,
            summary.failed,
            summary.skipped,
            summary.elapsed
        );
        summary
    }

    /// Score one ticker for one date and persist the result.
    pub fn process_ticker(&self, ticker: &str, date: NaiveDate) -> Result<ScoreRecord> {
        let record = build_record(self.inputs.as_ref(), ticker, date);
        if let Err(first) = self.store.upsert(&record) {
            warn!("Store write failed for {}, retrying once: {}", ticker, first);
            self.store.upsert(&record)?;
        }
        Ok(record)
    }

    /// Queue ordered by ascending days-until-earnings; tickers with no
    /// known report date sort last. The sort is stable, so ties keep
    /// universe order and the queue is deterministic.
    fn prioritized_queue(&self, tickers: Vec<String>, max_tickers: usize) -> Vec<String> {
        let proximity: HashMap<String, i64> = match self.earnings.days_until_earnings(&tickers) {
            Ok(map) => map,
            Err(e) => {
                warn!("Earnings calendar unavailable, keeping universe order: {}", e);
                HashMap::new()
            }
        };

        let mut queue = tickers;
        queue.sort_by_key(|ticker| proximity.get(ticker).copied().unwrap_or(i64::MAX));
        if max_tickers > 0 {
            queue.truncate(max_tickers);
        }
        queue
    }

    fn already_scored(&self, ticker: &str, today: NaiveDate) -> bool {
        match self.store.get_current(ticker) {
            Ok(Some(record)) => {
                record.calculation_date == today && record.all_domains_succeeded()
            }
            Ok(None) => false,
            Err(e) => {
                // A read failure must not hide the ticker from the run.
                warn!("Skip check failed for {}, recomputing: {}", ticker, e);
                false
            }
        }
    }
}

/// Build the record for one ticker: the three domains run independently,
/// and a failure in one (including an input-load failure) never blocks
/// the others.
fn build_record<R: RawInputStore>(inputs: &R, ticker: &str, date: NaiveDate) -> ScoreRecord {
    let technical_partial = match inputs.technical(ticker) {
        Ok(snapshot) => technical::compute(&snapshot),
        Err(e) => TechnicalPartial::failed(0, format!("failed to load technical inputs: {}", e)),
    };
    let fundamental_partial = match inputs.fundamental(ticker) {
        Ok(snapshot) => fundamental::compute(&snapshot),
        Err(e) => FundamentalPartial::failed(0, format!("failed to load fundamental inputs: {}", e)),
    };
    let analyst_partial = match inputs.analyst(ticker) {
        Ok(snapshot) => analyst::compute(&snapshot),
        Err(e) => AnalystPartial::failed(0, format!("failed to load analyst inputs: {}", e)),
    };

    ScoreRecord::assemble(
        ticker,
        date,
        technical_partial,
        fundamental_partial,
        analyst_partial,
    )
}

/// Compute and persist one ticker. A store failure is retried once with
/// a fresh transaction, then recorded against the ticker.
fn compute_and_store<S: ScoreStore, R: RawInputStore>(
    store: &S,
    inputs: &R,
    ticker: &str,
    date: NaiveDate,
) -> TickerReport {
    let record = build_record(inputs, ticker, date);

    if let Err(first) = store.upsert(&record) {
        warn!("Store write failed for {}, retrying once: {}", ticker, first);
        if let Err(second) = store.upsert(&record) {
            error!("Store write failed twice for {}: {}", ticker, second);
            return TickerReport {
                outcome: TickerOutcome::Failed,
                errors: vec![format!("store write failed: {}", second)],
            };
        }
    }

    TickerReport {
        outcome: record.ticker_outcome(),
        errors: record.domain_errors(),
    }
}
