//! End-to-end pipeline tests over fakes plus a real SQLite store.

mod common;

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};

use common::{scratch_store, CollectingSink, FakeInputs, NoCalendar, QuoteProvider};
use marketscore_core::{
    OrchestratorConfig, RunState, ScoringService, SqliteScoreStore,
};
use marketscore_market_data::models::DataKind;
use marketscore_market_data::registry::{ProviderRouter, QuotaTracker, RouterConfig};

fn service(
    store: SqliteScoreStore,
    universe: &[&str],
) -> ScoringService<SqliteScoreStore, FakeInputs, NoCalendar, CollectingSink> {
    let quota = Arc::new(QuotaTracker::new());
    let router = Arc::new(ProviderRouter::new(
        vec![Arc::new(QuoteProvider)],
        Arc::clone(&quota),
        RouterConfig::default(),
    ));
    ScoringService::new(
        Arc::new(store),
        Arc::new(FakeInputs::new(universe)),
        Arc::new(NoCalendar),
        router,
        quota,
        Arc::new(CollectingSink::default()),
        OrchestratorConfig::default(),
    )
}

#[tokio::test]
async fn test_daily_run_scores_and_persists() {
    let svc = service(scratch_store("daily_run"), &["AAPL", "MSFT"]);

    let summary = svc.run_daily_scoring(0, 1.0, false).await.unwrap();
    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);

    let status = svc.get_status().unwrap();
    assert_eq!(status.domains.technical.success, 2);
    assert_eq!(status.domains.analyst.success, 2);
}

#[tokio::test]
async fn test_second_run_skips_already_scored_ticker() {
    let svc = service(scratch_store("skip_run"), &["AAPL"]);

    let first = svc.run_daily_scoring(0, 1.0, false).await.unwrap();
    assert_eq!(first.succeeded, 1);

    // The current row already has all three domains successful for
    // today, so the ticker is skipped without recomputation.
    let second = svc.run_daily_scoring(0, 1.0, false).await.unwrap();
    assert_eq!(second.skipped, 1);
    assert_eq!(second.succeeded, 0);

    // force_recalculate overrides the skip.
    let forced = svc.run_daily_scoring(0, 1.0, true).await.unwrap();
    assert_eq!(forced.succeeded, 1);
    assert_eq!(forced.skipped, 0);
}

#[tokio::test]
async fn test_refresh_market_data_feeds_sink() {
    let svc = service(scratch_store("refresh"), &["AAPL", "MSFT", "GOOG"]);

    let summary = svc.refresh_market_data(&[DataKind::Quote]).await.unwrap();
    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_process_single_ticker_for_past_date() {
    let svc = service(scratch_store("single"), &["AAPL"]);
    let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

    let record = svc.process_single_ticker("AAPL", date).unwrap();
    assert_eq!(record.calculation_date, date);
    assert!(record.all_domains_succeeded());
    assert!(record.overall_score.is_some());
}

#[tokio::test]
async fn test_cleanup_retains_most_recent_days() {
    let svc = service(scratch_store("cleanup"), &["AAPL"]);

    let today = Utc::now().date_naive();
    for offset in 0..150 {
        let date = today - Duration::days(offset);
        svc.process_single_ticker("AAPL", date).unwrap();
    }

    let deleted = svc.cleanup(100).unwrap();
    assert_eq!(deleted, 50);
}
