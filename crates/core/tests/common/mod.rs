//! Shared fixtures for integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use rust_decimal_macros::dec;

use marketscore_core::db::{create_pool, get_connection, DbPool};
use marketscore_core::{
    AnalystInputs, EarningsCalendar, FundamentalInputs, RawDataSink, RawInputStore, Result,
    SqliteScoreStore, TechnicalInputs,
};
use marketscore_market_data::errors::FetchError;
use marketscore_market_data::models::{DataKind, FetchPayload, FetchRequest, PriceQuote};
use marketscore_market_data::provider::{ProviderCapabilities, ProviderClient, ProviderLimits};

const DDL: &str = "
    CREATE TABLE IF NOT EXISTS scores_current (
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
    CREATE TABLE IF NOT EXISTS scores_history (
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

/// A file-backed scratch database; `:memory:` would give every pooled
/// connection its own empty database.
pub fn scratch_store(name: &str) -> SqliteScoreStore {
    let path = std::env::temp_dir().join(format!(
        "marketscore_{}_{}.db",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    let pool: Arc<DbPool> =
        create_pool(path.to_str().expect("temp path is valid utf-8")).expect("pool");
    {
        let mut conn = get_connection(&pool).expect("connection");
        conn.batch_execute(DDL).expect("schema");
    }
    SqliteScoreStore::new(pool)
}

pub struct FakeInputs {
    pub universe: Vec<String>,
}

impl FakeInputs {
    pub fn new(universe: &[&str]) -> Self {
        Self {
            universe: universe.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RawInputStore for FakeInputs {
    fn tickers(&self) -> Result<Vec<String>> {
        Ok(self.universe.clone())
    }

    fn technical(&self, _ticker: &str) -> Result<TechnicalInputs> {
        Ok(TechnicalInputs {
            close: Some(dec!(110)),
            sma_20: Some(dec!(100)),
            sma_50: Some(dec!(95)),
            sma_200: Some(dec!(90)),
            rsi_14: Some(65.0),
            macd: Some(1.5),
            macd_signal: Some(1.0),
            high_52w: Some(dec!(120)),
            low_52w: Some(dec!(80)),
            avg_volume_20: Some(dec!(1000000)),
            volume: Some(dec!(1500000)),
        })
    }

    fn fundamental(&self, _ticker: &str) -> Result<FundamentalInputs> {
        Ok(FundamentalInputs {
            pe_ratio: Some(dec!(20)),
            price_to_book: Some(dec!(3)),
            debt_to_equity: Some(dec!(1.0)),
            return_on_equity: Some(dec!(0.25)),
            revenue_growth: Some(dec!(0.10)),
            eps_growth: Some(dec!(0.20)),
            gross_margin: Some(dec!(0.50)),
            operating_margin: Some(dec!(0.25)),
            current_ratio: Some(dec!(1.5)),
            free_cash_flow_yield: Some(dec!(0.05)),
        })
    }

    fn analyst(&self, _ticker: &str) -> Result<AnalystInputs> {
        Ok(AnalystInputs {
            rating_strong_buy: Some(10),
            rating_buy: Some(20),
            rating_hold: Some(8),
            rating_sell: Some(2),
            price_target_mean: Some(dec!(110)),
            price: Some(dec!(100)),
            eps_revisions_up_30d: Some(6),
            eps_revisions_down_30d: Some(2),
            last_surprise_pct: Some(4.0),
        })
    }
}

pub struct NoCalendar;

impl EarningsCalendar for NoCalendar {
    fn days_until_earnings(&self, _tickers: &[String]) -> Result<HashMap<String, i64>> {
        Ok(HashMap::new())
    }
}

#[derive(Default)]
pub struct CollectingSink {
    pub stored: Mutex<Vec<(DataKind, usize)>>,
}

impl RawDataSink for CollectingSink {
    fn store_payloads(
        &self,
        kind: DataKind,
        payloads: &HashMap<String, FetchPayload>,
    ) -> Result<()> {
        self.stored.lock().unwrap().push((kind, payloads.len()));
        Ok(())
    }
}

pub struct QuoteProvider;

#[async_trait]
impl ProviderClient for QuoteProvider {
    fn id(&self) -> &'static str {
        "TEST_QUOTES"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            kinds: &[DataKind::Quote],
            batch_kinds: &[DataKind::Quote],
            max_batch_size: 100,
        }
    }

    fn limits(&self) -> ProviderLimits {
        ProviderLimits {
            daily_limit: 1000,
            per_minute_limit: 1000,
        }
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
    ) -> std::result::Result<FetchPayload, FetchError> {
        Ok(quote_payload(&request.symbol))
    }

    async fn fetch_batch(
        &self,
        symbols: &[String],
        _kind: DataKind,
    ) -> std::result::Result<HashMap<String, FetchPayload>, FetchError> {
        Ok(symbols
            .iter()
            .map(|s| (s.clone(), quote_payload(s)))
            .collect())
    }
}

fn quote_payload(symbol: &str) -> FetchPayload {
    FetchPayload::Quote(PriceQuote {
        symbol: symbol.to_string(),
        price: dec!(187.44),
        previous_close: Some(dec!(185.01)),
        volume: None,
        as_of: chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
    })
}
