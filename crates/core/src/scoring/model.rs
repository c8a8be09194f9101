//! Score record model.
//!
//! One [`ScoreRecord`] per (ticker, calculation date), assembled from the
//! three per-domain partials the computers produce. The record is flat so
//! it maps directly onto the current/history table pair.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one domain's calculation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    /// Data quality >= 80 and no numeric failure.
    Success,
    /// Data quality 50-79.
    Partial,
    /// Data quality < 50, or an unrecoverable numeric error.
    Failed,
}

impl CalculationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

impl From<&str> for CalculationStatus {
    /// Lenient parse for values read back from storage; anything
    /// unrecognized is treated as failed.
    fn from(value: &str) -> Self {
        match value {
            "success" => Self::Success,
            "partial" => Self::Partial,
            _ => Self::Failed,
        }
    }
}

impl std::fmt::Display for CalculationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Technical domain partial result.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TechnicalPartial {
    pub momentum: Option<f64>,
    pub trend: Option<f64>,
    pub volatility: Option<f64>,
    pub volume: Option<f64>,
    pub relative_strength: Option<f64>,
    pub composite: Option<f64>,
    pub data_quality: i32,
    pub status: CalculationStatus,
    pub error: Option<String>,
}

/// Fundamental domain partial result.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FundamentalPartial {
    pub valuation: Option<f64>,
    pub growth: Option<f64>,
    pub profitability: Option<f64>,
    pub leverage: Option<f64>,
    pub cash_flow: Option<f64>,
    pub composite: Option<f64>,
    pub data_quality: i32,
    pub status: CalculationStatus,
    pub error: Option<String>,
}

/// Analyst domain partial result.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnalystPartial {
    pub consensus: Option<f64>,
    pub price_target: Option<f64>,
    pub revision: Option<f64>,
    pub surprise: Option<f64>,
    pub composite: Option<f64>,
    pub data_quality: i32,
    pub status: CalculationStatus,
    pub error: Option<String>,
}

impl Default for CalculationStatus {
    fn default() -> Self {
        Self::Failed
    }
}

macro_rules! failed_partial {
    ($name:ident) => {
        impl $name {
            /// A domain that produced no scores, with the reason recorded.
            pub fn failed(data_quality: i32, error: impl Into<String>) -> Self {
                Self {
                    data_quality,
                    status: CalculationStatus::Failed,
                    error: Some(error.into()),
                    ..Default::default()
                }
            }
        }
    };
}

failed_partial!(TechnicalPartial);
failed_partial!(FundamentalPartial);
failed_partial!(AnalystPartial);

/// Ticker-level classification of an assembled record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickerOutcome {
    /// All three domains succeeded.
    Succeeded,
    /// Mixed statuses.
    Partial,
    /// All three domains failed.
    Failed,
}

/// The per-ticker-per-day aggregate of computed scores.
///
/// Unique on `(ticker, calculation_date)`. The current-table copy is
/// overwritten by later runs; history copies are immutable once written
/// except for same-day reprocessing, which replaces in place.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub ticker: String,
    pub calculation_date: NaiveDate,

    // Technical domain
    pub momentum_score: Option<f64>,
    pub trend_score: Option<f64>,
    pub volatility_score: Option<f64>,
    pub volume_score: Option<f64>,
    pub relative_strength_score: Option<f64>,
    pub technical_composite: Option<f64>,
    pub technical_quality: i32,
    pub technical_status: CalculationStatus,
    pub technical_error: Option<String>,

    // Fundamental domain
    pub valuation_score: Option<f64>,
    pub growth_score: Option<f64>,
    pub profitability_score: Option<f64>,
    pub leverage_score: Option<f64>,
    pub cash_flow_score: Option<f64>,
    pub fundamental_composite: Option<f64>,
    pub fundamental_quality: i32,
    pub fundamental_status: CalculationStatus,
    pub fundamental_error: Option<String>,

    // Analyst domain
    pub consensus_score: Option<f64>,
    pub price_target_score: Option<f64>,
    pub revision_score: Option<f64>,
    pub surprise_score: Option<f64>,
    pub analyst_composite: Option<f64>,
    pub analyst_quality: i32,
    pub analyst_status: CalculationStatus,
    pub analyst_error: Option<String>,

    pub overall_score: Option<f64>,
    pub created_at: NaiveDateTime,
}

impl ScoreRecord {
    /// Merge the three domain partials into one record.
    pub fn assemble(
        ticker: impl Into<String>,
        calculation_date: NaiveDate,
        technical: TechnicalPartial,
        fundamental: FundamentalPartial,
        analyst: AnalystPartial,
    ) -> Self {
        let composites: Vec<f64> = [
            technical.composite,
            fundamental.composite,
            analyst.composite,
        ]
        .into_iter()
        .flatten()
        .collect();

        let overall_score = if composites.is_empty() {
            None
        } else {
            Some(composites.iter().sum::<f64>() / composites.len() as f64)
        };

        Self {
            ticker: ticker.into(),
            calculation_date,
            momentum_score: technical.momentum,
            trend_score: technical.trend,
            volatility_score: technical.volatility,
            volume_score: technical.volume,
            relative_strength_score: technical.relative_strength,
            technical_composite: technical.composite,
            technical_quality: technical.data_quality,
            technical_status: technical.status,
            technical_error: technical.error,
            valuation_score: fundamental.valuation,
            growth_score: fundamental.growth,
            profitability_score: fundamental.profitability,
            leverage_score: fundamental.leverage,
            cash_flow_score: fundamental.cash_flow,
            fundamental_composite: fundamental.composite,
            fundamental_quality: fundamental.data_quality,
            fundamental_status: fundamental.status,
            fundamental_error: fundamental.error,
            consensus_score: analyst.consensus,
            price_target_score: analyst.price_target,
            revision_score: analyst.revision,
            surprise_score: analyst.surprise,
            analyst_composite: analyst.composite,
            analyst_quality: analyst.data_quality,
            analyst_status: analyst.status,
            analyst_error: analyst.error,
            overall_score,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// True when all three domains completed with `Success`.
    ///
    /// Drives the orchestrator's skip check for already-scored tickers.
    pub fn all_domains_succeeded(&self) -> bool {
        self.technical_status == CalculationStatus::Success
            && self.fundamental_status == CalculationStatus::Success
            && self.analyst_status == CalculationStatus::Success
    }

    /// Classify the record at ticker granularity for run accounting.
    pub fn ticker_outcome(&self) -> TickerOutcome {
        let statuses = [
            self.technical_status,
            self.fundamental_status,
            self.analyst_status,
        ];
        if statuses.iter().all(|s| *s == CalculationStatus::Success) {
            TickerOutcome::Succeeded
        } else if statuses.iter().all(|s| *s == CalculationStatus::Failed) {
            TickerOutcome::Failed
        } else {
            TickerOutcome::Partial
        }
    }

    /// Domain error messages, for run summaries.
    pub fn domain_errors(&self) -> Vec<String> {
        [
            self.technical_error.as_ref().map(|e| format!("technical: {}", e)),
            self.fundamental_error.as_ref().map(|e| format!("fundamental: {}", e)),
            self.analyst_error.as_ref().map(|e| format!("analyst: {}", e)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
