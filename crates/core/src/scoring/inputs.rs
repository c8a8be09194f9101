//! Raw input snapshots for the score computers.
//!
//! The price/indicator, ratio, and earnings/estimate tables are owned by
//! the collection side of the pipeline; the computers only ever see these
//! already-loaded snapshots. [`RawInputStore`] is the seam to those
//! tables, so tests run against fakes and the computers stay pure.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::Result;

/// Count the `Some` fields among a required set.
macro_rules! count_present {
    ($($field:expr),+ $(,)?) => {{
        let mut present = 0usize;
        let mut required = 0usize;
        $(
            required += 1;
            if $field.is_some() {
                present += 1;
            }
        )+
        (present, required)
    }};
}

/// Latest indicator snapshot for one ticker.
///
/// `volume` is the only optional extra: without it the volume sub-score
/// is skipped rather than counted against data quality.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TechnicalInputs {
    pub close: Option<Decimal>,
    pub sma_20: Option<Decimal>,
    pub sma_50: Option<Decimal>,
    pub sma_200: Option<Decimal>,
    pub rsi_14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub high_52w: Option<Decimal>,
    pub low_52w: Option<Decimal>,
    pub avg_volume_20: Option<Decimal>,
    pub volume: Option<Decimal>,
}

impl TechnicalInputs {
    /// (present, required) counts over the required field set.
    pub fn field_presence(&self) -> (usize, usize) {
        count_present!(
            self.close,
            self.sma_20,
            self.sma_50,
            self.sma_200,
            self.rsi_14,
            self.macd,
            self.macd_signal,
            self.high_52w,
            self.low_52w,
            self.avg_volume_20,
        )
    }
}

/// Latest fundamental ratio snapshot for one ticker.
///
/// Ratios are stored as fractions (0.25 = 25%) except the valuation
/// multiples, which are plain multiples.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FundamentalInputs {
    pub pe_ratio: Option<Decimal>,
    pub price_to_book: Option<Decimal>,
    pub debt_to_equity: Option<Decimal>,
    pub return_on_equity: Option<Decimal>,
    pub revenue_growth: Option<Decimal>,
    pub eps_growth: Option<Decimal>,
    pub gross_margin: Option<Decimal>,
    pub operating_margin: Option<Decimal>,
    pub current_ratio: Option<Decimal>,
    pub free_cash_flow_yield: Option<Decimal>,
}

impl FundamentalInputs {
    /// (present, required) counts over the required field set.
    pub fn field_presence(&self) -> (usize, usize) {
        count_present!(
            self.pe_ratio,
            self.price_to_book,
            self.debt_to_equity,
            self.return_on_equity,
            self.revenue_growth,
            self.eps_growth,
            self.gross_margin,
            self.operating_margin,
            self.current_ratio,
            self.free_cash_flow_yield,
        )
    }
}

/// Latest analyst coverage snapshot for one ticker.
///
/// `last_surprise_pct` is optional: not every ticker has a scored
/// earnings history, so its absence skips the surprise sub-score instead
/// of dragging quality down.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnalystInputs {
    pub rating_strong_buy: Option<u32>,
    pub rating_buy: Option<u32>,
    pub rating_hold: Option<u32>,
    pub rating_sell: Option<u32>,
    pub price_target_mean: Option<Decimal>,
    pub price: Option<Decimal>,
    pub eps_revisions_up_30d: Option<u32>,
    pub eps_revisions_down_30d: Option<u32>,
    pub last_surprise_pct: Option<f64>,
}

impl AnalystInputs {
    /// (present, required) counts over the required field set.
    pub fn field_presence(&self) -> (usize, usize) {
        count_present!(
            self.rating_strong_buy,
            self.rating_buy,
            self.rating_hold,
            self.rating_sell,
            self.price_target_mean,
            self.price,
            self.eps_revisions_up_30d,
            self.eps_revisions_down_30d,
        )
    }
}

/// Read access to the already-persisted raw data tables.
///
/// Implemented over the collection side's tables in production; tests
/// substitute in-memory fakes.
pub trait RawInputStore: Send + Sync {
    /// The ticker universe eligible for scoring.
    fn tickers(&self) -> Result<Vec<String>>;

    fn technical(&self, ticker: &str) -> Result<TechnicalInputs>;

    fn fundamental(&self, ticker: &str) -> Result<FundamentalInputs>;

    fn analyst(&self, ticker: &str) -> Result<AnalystInputs>;
}

/// Earnings-date proximity lookup used to prioritize the scoring queue.
pub trait EarningsCalendar: Send + Sync {
    /// Days until the next earnings report per ticker. Tickers with no
    /// known report date are absent from the map and sort last.
    fn days_until_earnings(&self, tickers: &[String]) -> Result<HashMap<String, i64>>;
}
