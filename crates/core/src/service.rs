//! Public facade for the scoring pipeline.
//!
//! `ScoringService` is what the external CLI/scheduler talks to:
//! daily scoring runs, single-ticker processing, the status surface,
//! history retention, and the raw-data refresh that feeds the
//! collection-side tables.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use log::{info, warn};
use serde::Serialize;

use marketscore_market_data::models::{DataKind, FetchPayload};
use marketscore_market_data::registry::{BatchPlan, ProviderRouter, QuotaTracker, QuotaUsage};

use crate::errors::Result;
use crate::scoring::inputs::{EarningsCalendar, RawInputStore};
use crate::scoring::model::ScoreRecord;
use crate::scoring::orchestrator::{OrchestratorConfig, RunSummary, ScoreOrchestrator};
use crate::store::{DomainStatusCounts, ScoreStore};

/// Writer for fetched raw payloads.
///
/// The collection-side tables (prices/indicators, ratios, earnings) are
/// owned by external collaborators; this trait is the hand-off point.
pub trait RawDataSink: Send + Sync {
    fn store_payloads(
        &self,
        kind: DataKind,
        payloads: &HashMap<String, FetchPayload>,
    ) -> Result<()>;
}

/// Snapshot of pipeline health: per-provider quota usage and per-domain
/// success rates for today.
#[derive(Debug, Serialize)]
pub struct PipelineStatus {
    pub providers: Vec<QuotaUsage>,
    pub domains: DomainStatusCounts,
}

/// Aggregate result of a raw-data refresh.
#[derive(Debug, Default, Serialize)]
pub struct IngestSummary {
    pub fetched: usize,
    pub failed: usize,
    /// (symbol, last error text) for symbols no provider served.
    pub failures: Vec<(String, String)>,
}

/// The pipeline facade.
pub struct ScoringService<S, R, E, K>
where
    S: ScoreStore + 'static,
    R: RawInputStore + 'static,
    E: EarningsCalendar + 'static,
    K: RawDataSink,
{
    orchestrator: ScoreOrchestrator<S, R, E>,
    store: Arc<S>,
    inputs: Arc<R>,
    router: Arc<ProviderRouter>,
    quota: Arc<QuotaTracker>,
    sink: Arc<K>,
}

impl<S, R, E, K> ScoringService<S, R, E, K>
where
    S: ScoreStore + 'static,
    R: RawInputStore + 'static,
    E: EarningsCalendar + 'static,
    K: RawDataSink,
{
    pub fn new(
        store: Arc<S>,
        inputs: Arc<R>,
        earnings: Arc<E>,
        router: Arc<ProviderRouter>,
        quota: Arc<QuotaTracker>,
        sink: Arc<K>,
        config: OrchestratorConfig,
    ) -> Self {
        let orchestrator = ScoreOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&inputs),
            earnings,
            config,
        );
        Self {
            orchestrator,
            store,
            inputs,
            router,
            quota,
            sink,
        }
    }

    /// Run the daily scoring pass.
    ///
    /// `max_tickers == 0` means no cap; the time budget is wall-clock
    /// hours and cancellation is cooperative between ticker units.
    pub async fn run_daily_scoring(
        &self,
        max_tickers: usize,
        max_time_hours: f64,
        force_recalculate: bool,
    ) -> Result<RunSummary> {
        let budget = Duration::from_secs_f64(max_time_hours.max(0.0) * 3600.0);
        Ok(self
            .orchestrator
            .run(max_tickers, budget, force_recalculate)
            .await)
    }

    /// Score one ticker for one date and persist the result.
    pub fn process_single_ticker(&self, ticker: &str, date: NaiveDate) -> Result<ScoreRecord> {
        self.orchestrator.process_ticker(ticker, date)
    }

    /// Per-provider quota usage and per-domain success rates for today.
    pub fn get_status(&self) -> Result<PipelineStatus> {
        Ok(PipelineStatus {
            providers: self.quota.usage(),
            domains: self.store.status_counts(Utc::now().date_naive())?,
        })
    }

    /// Prune score history, keeping `days_to_keep` calendar days.
    pub fn cleanup(&self, days_to_keep: i64) -> Result<usize> {
        self.store.prune_history(days_to_keep)
    }

    /// Fetch fresh raw data for the whole universe and hand the payloads
    /// to the sink. Per-symbol failures are collected, never fatal.
    pub async fn refresh_market_data(&self, kinds: &[DataKind]) -> Result<IngestSummary> {
        let tickers = self.inputs.tickers()?;
        let mut summary = IngestSummary::default();

        for &kind in kinds {
            let Some(primary) = self.router.primary_for(kind) else {
                warn!("No provider serves {}, skipping refresh for it", kind);
                summary
                    .failures
                    .push(("*".to_string(), format!("no provider for {}", kind)));
                continue;
            };

            // Batches are sized to the primary provider; the router
            // re-chunks if a fallback declares a smaller batch size.
            let batch_size = primary.capabilities().max_batch_size;
            let plan = BatchPlan::plan(&tickers, kind, batch_size);
            info!(
                "Refreshing {}: {} symbols in {} batches",
                kind,
                plan.symbol_count(),
                plan.len()
            );

            for batch in plan.batches() {
                let outcome = self.router.route_batch(&batch.symbols, kind).await?;
                if !outcome.payloads.is_empty() {
                    self.sink.store_payloads(kind, &outcome.payloads)?;
                    summary.fetched += outcome.payloads.len();
                }
                summary.failed += outcome.failures.len();
                summary.failures.extend(outcome.failures);
            }
        }

        info!(
            "Refresh complete: {} payloads stored, {} symbols failed",
            summary.fetched, summary.failed
        );
        Ok(summary)
    }
}
