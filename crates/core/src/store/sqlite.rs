//! SQLite-backed score store.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use diesel::prelude::*;
use log::debug;

use super::model::{CurrentScoreRowDb, ScoreRowDb};
use super::{DomainStatusCounts, ScoreStore};
use crate::db::{get_connection, DbPool};
use crate::errors::{DatabaseError, Error, Result};
use crate::schema::{scores_current, scores_history};
use crate::scoring::model::{CalculationStatus, ScoreRecord};

pub struct SqliteScoreStore {
    pool: Arc<DbPool>,
}

impl SqliteScoreStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl ScoreStore for SqliteScoreStore {
    fn upsert(&self, record: &ScoreRecord) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        // Both rows or neither; INSERT OR REPLACE resolves each table's
        // primary key conflict in place.
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::replace_into(scores_current::table)
                .values(CurrentScoreRowDb::from(record))
                .execute(conn)?;
            diesel::replace_into(scores_history::table)
                .values(ScoreRowDb::from(record))
                .execute(conn)?;
            Ok(())
        })
        .map_err(|e| Error::Database(DatabaseError::QueryFailed(e.to_string())))?;

        debug!(
            "Upserted scores for {} on {}",
            record.ticker, record.calculation_date
        );
        Ok(())
    }

    fn get_current(&self, ticker: &str) -> Result<Option<ScoreRecord>> {
        let mut conn = get_connection(&self.pool)?;

        scores_current::table
            .filter(scores_current::ticker.eq(ticker))
            .first::<ScoreRowDb>(&mut conn)
            .optional()
            .map(|row| row.map(ScoreRecord::from))
            .map_err(Error::from)
    }

    fn get_history(&self, ticker: &str) -> Result<Vec<ScoreRecord>> {
        let mut conn = get_connection(&self.pool)?;

        scores_history::table
            .filter(scores_history::ticker.eq(ticker))
            .order(scores_history::calculation_date.desc())
            .load::<ScoreRowDb>(&mut conn)
            .map(|rows| rows.into_iter().map(ScoreRecord::from).collect())
            .map_err(Error::from)
    }

    fn prune_history(&self, days_to_keep: i64) -> Result<usize> {
        if days_to_keep <= 0 {
            return Err(Error::Validation(
                "days_to_keep must be positive".to_string(),
            ));
        }

        let mut conn = get_connection(&self.pool)?;

        let latest: Option<NaiveDate> = scores_history::table
            .select(diesel::dsl::max(scores_history::calculation_date))
            .first(&mut conn)?;

        let Some(latest) = latest else {
            return Ok(0);
        };

        // Keep `days_to_keep` distinct calendar days ending at the most
        // recent date present.
        let cutoff = latest - Duration::days(days_to_keep - 1);

        let deleted = diesel::delete(
            scores_history::table.filter(scores_history::calculation_date.lt(cutoff)),
        )
        .execute(&mut conn)?;

        debug!(
            "Pruned {} history rows older than {} ({} days kept)",
            deleted, cutoff, days_to_keep
        );
        Ok(deleted)
    }

    fn status_counts(&self, date: NaiveDate) -> Result<DomainStatusCounts> {
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<(String, String, String)> = scores_history::table
            .filter(scores_history::calculation_date.eq(date))
            .select((
                scores_history::technical_status,
                scores_history::fundamental_status,
                scores_history::analyst_status,
            ))
            .load(&mut conn)?;

        let mut counts = DomainStatusCounts::default();
        for (technical, fundamental, analyst) in rows {
            counts
                .technical
                .record(CalculationStatus::from(technical.as_str()));
            counts
                .fundamental
                .record(CalculationStatus::from(fundamental.as_str()));
            counts
                .analyst
                .record(CalculationStatus::from(analyst.as_str()));
        }
        Ok(counts)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::scoring::model::{AnalystPartial, FundamentalPartial, TechnicalPartial};
    use diesel::connection::SimpleConnection;

    const TEST_DDL: &str = "
        CREATE TABLE scores_current (
            ticker TEXT PRIMARY KEY NOT NULL,
            calculation_date DATE NOT NULL,
            momentum_score DOUBLE, trend_score DOUBLE, volatility_score DOUBLE,
            volume_score DOUBLE, relative_strength_score DOUBLE,
            technical_composite DOUBLE, technical_quality INTEGER NOT NULL,
            technical_status TEXT NOT NULL, technical_error TEXT,
            valuation_score DOUBLE, growth_score DOUBLE, profitability_score DOUBLE,
            leverage_score DOUBLE, cash_flow_score DOUBLE,
            fundamental_composite DOUBLE, fundamental_quality INTEGER NOT NULL,
            fundamental_status TEXT NOT NULL, fundamental_error TEXT,
            consensus_score DOUBLE, price_target_score DOUBLE, revision_score DOUBLE,
            surprise_score DOUBLE,
            analyst_composite DOUBLE, analyst_quality INTEGER NOT NULL,
            analyst_status TEXT NOT NULL, analyst_error TEXT,
            overall_score DOUBLE,
            created_at TIMESTAMP NOT NULL
        );
        CREATE TABLE scores_history (
            ticker TEXT NOT NULL,
            calculation_date DATE NOT NULL,
            momentum_score DOUBLE, trend_score DOUBLE, volatility_score DOUBLE,
            volume_score DOUBLE, relative_strength_score DOUBLE,
            technical_composite DOUBLE, technical_quality INTEGER NOT NULL,
            technical_status TEXT NOT NULL, technical_error TEXT,
            valuation_score DOUBLE, growth_score DOUBLE, profitability_score DOUBLE,
            leverage_score DOUBLE, cash_flow_score DOUBLE,
            fundamental_composite DOUBLE, fundamental_quality INTEGER NOT NULL,
            fundamental_status TEXT NOT NULL, fundamental_error TEXT,
            consensus_score DOUBLE, price_target_score DOUBLE, revision_score DOUBLE,
            surprise_score DOUBLE,
            analyst_composite DOUBLE, analyst_quality INTEGER NOT NULL,
            analyst_status TEXT NOT NULL, analyst_error TEXT,
            overall_score DOUBLE,
            created_at TIMESTAMP NOT NULL,
            PRIMARY KEY (ticker, calculation_date)
        );
    ";

    /// In-memory store. Pool size 1 so every query sees the same
    /// `:memory:` database.
    pub(crate) fn memory_store() -> SqliteScoreStore {
        let manager =
            diesel::r2d2::ConnectionManager::<diesel::SqliteConnection>::new(":memory:");
        let pool = diesel::r2d2::Pool::builder()
            .max_size(1)
            .build(manager)
            .expect("failed to build in-memory pool");
        let pool = Arc::new(pool);
        {
            let mut conn = pool.get().expect("failed to get connection");
            conn.batch_execute(TEST_DDL).expect("failed to create tables");
        }
        SqliteScoreStore::new(pool)
    }

    pub(crate) fn sample_record(ticker: &str, date: NaiveDate) -> ScoreRecord {
        ScoreRecord::assemble(
            ticker,
            date,
            TechnicalPartial {
                momentum: Some(65.0),
                composite: Some(65.0),
                data_quality: 100,
                status: CalculationStatus::Success,
                ..Default::default()
            },
            FundamentalPartial {
                valuation: Some(70.0),
                composite: Some(70.0),
                data_quality: 90,
                status: CalculationStatus::Success,
                ..Default::default()
            },
            AnalystPartial {
                consensus: Some(60.0),
                composite: Some(60.0),
                data_quality: 100,
                status: CalculationStatus::Success,
                ..Default::default()
            },
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_upsert_then_get_current() {
        let store = memory_store();
        let record = sample_record("AAPL", date(2024, 3, 10));
        store.upsert(&record).unwrap();

        let current = store.get_current("AAPL").unwrap().unwrap();
        assert_eq!(current.ticker, "AAPL");
        assert_eq!(current.calculation_date, date(2024, 3, 10));
        assert_eq!(current.momentum_score, Some(65.0));
        assert!(current.all_domains_succeeded());

        assert!(store.get_current("MSFT").unwrap().is_none());
    }

    #[test]
    fn test_upsert_is_idempotent_on_history() {
        let store = memory_store();
        let record = sample_record("AAPL", date(2024, 3, 10));

        store.upsert(&record).unwrap();
        store.upsert(&record).unwrap();

        let history = store.get_history("AAPL").unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_same_day_reprocess_overwrites_not_duplicates() {
        let store = memory_store();
        let mut record = sample_record("AAPL", date(2024, 3, 10));
        store.upsert(&record).unwrap();

        record.momentum_score = Some(42.0);
        store.upsert(&record).unwrap();

        let history = store.get_history("AAPL").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].momentum_score, Some(42.0));
    }

    #[test]
    fn test_current_row_latest_wins() {
        let store = memory_store();
        store
            .upsert(&sample_record("AAPL", date(2024, 3, 10)))
            .unwrap();
        store
            .upsert(&sample_record("AAPL", date(2024, 3, 11)))
            .unwrap();

        let current = store.get_current("AAPL").unwrap().unwrap();
        assert_eq!(current.calculation_date, date(2024, 3, 11));

        // History keeps both days.
        let history = store.get_history("AAPL").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].calculation_date, date(2024, 3, 11));
    }

    #[test]
    fn test_prune_keeps_most_recent_days() {
        let store = memory_store();
        let start = date(2023, 10, 1);
        for offset in 0..150 {
            let day = start + Duration::days(offset);
            store.upsert(&sample_record("AAPL", day)).unwrap();
        }

        let deleted = store.prune_history(100).unwrap();
        assert_eq!(deleted, 50);

        let history = store.get_history("AAPL").unwrap();
        assert_eq!(history.len(), 100);

        let latest = start + Duration::days(149);
        let oldest_kept = latest - Duration::days(99);
        assert_eq!(history[0].calculation_date, latest);
        assert_eq!(history[history.len() - 1].calculation_date, oldest_kept);

        // Current rows are never pruned by age.
        assert!(store.get_current("AAPL").unwrap().is_some());
    }

    #[test]
    fn test_prune_empty_history_is_zero() {
        let store = memory_store();
        assert_eq!(store.prune_history(30).unwrap(), 0);
    }

    #[test]
    fn test_prune_rejects_non_positive_days() {
        let store = memory_store();
        assert!(store.prune_history(0).is_err());
    }

    #[test]
    fn test_status_counts_for_date() {
        let store = memory_store();
        let day = date(2024, 3, 10);
        store.upsert(&sample_record("AAPL", day)).unwrap();

        let mut failed = sample_record("MSFT", day);
        failed.analyst_status = CalculationStatus::Failed;
        failed.analyst_error = Some("no analyst ratings".to_string());
        store.upsert(&failed).unwrap();

        let counts = store.status_counts(day).unwrap();
        assert_eq!(counts.technical.success, 2);
        assert_eq!(counts.analyst.success, 1);
        assert_eq!(counts.analyst.failed, 1);
        assert!((counts.analyst.success_rate() - 0.5).abs() < 1e-9);
    }
}
