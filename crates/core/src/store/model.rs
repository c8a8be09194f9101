//! Database row types for the score tables.
//!
//! Both tables share one column layout, so a single queryable row type
//! loads from either; insertion needs one type per table because the
//! target table is part of the derive.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::scoring::model::{CalculationStatus, ScoreRecord};

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::scores_history)]
pub struct ScoreRowDb {
    pub ticker: String,
    pub calculation_date: NaiveDate,
    pub momentum_score: Option<f64>,
    pub trend_score: Option<f64>,
    pub volatility_score: Option<f64>,
    pub volume_score: Option<f64>,
    pub relative_strength_score: Option<f64>,
    pub technical_composite: Option<f64>,
    pub technical_quality: i32,
    pub technical_status: String,
    pub technical_error: Option<String>,
    pub valuation_score: Option<f64>,
    pub growth_score: Option<f64>,
    pub profitability_score: Option<f64>,
    pub leverage_score: Option<f64>,
    pub cash_flow_score: Option<f64>,
    pub fundamental_composite: Option<f64>,
    pub fundamental_quality: i32,
    pub fundamental_status: String,
    pub fundamental_error: Option<String>,
    pub consensus_score: Option<f64>,
    pub price_target_score: Option<f64>,
    pub revision_score: Option<f64>,
    pub surprise_score: Option<f64>,
    pub analyst_composite: Option<f64>,
    pub analyst_quality: i32,
    pub analyst_status: String,
    pub analyst_error: Option<String>,
    pub overall_score: Option<f64>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::scores_current)]
pub struct CurrentScoreRowDb {
    pub ticker: String,
    pub calculation_date: NaiveDate,
    pub momentum_score: Option<f64>,
    pub trend_score: Option<f64>,
    pub volatility_score: Option<f64>,
    pub volume_score: Option<f64>,
    pub relative_strength_score: Option<f64>,
    pub technical_composite: Option<f64>,
    pub technical_quality: i32,
    pub technical_status: String,
    pub technical_error: Option<String>,
    pub valuation_score: Option<f64>,
    pub growth_score: Option<f64>,
    pub profitability_score: Option<f64>,
    pub leverage_score: Option<f64>,
    pub cash_flow_score: Option<f64>,
    pub fundamental_composite: Option<f64>,
    pub fundamental_quality: i32,
    pub fundamental_status: String,
    pub fundamental_error: Option<String>,
    pub consensus_score: Option<f64>,
    pub price_target_score: Option<f64>,
    pub revision_score: Option<f64>,
    pub surprise_score: Option<f64>,
    pub analyst_composite: Option<f64>,
    pub analyst_quality: i32,
    pub analyst_status: String,
    pub analyst_error: Option<String>,
    pub overall_score: Option<f64>,
    pub created_at: NaiveDateTime,
}

impl From<&ScoreRecord> for ScoreRowDb {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            ticker: record.ticker.clone(),
            calculation_date: record.calculation_date,
            momentum_score: record.momentum_score,
            trend_score: record.trend_score,
            volatility_score: record.volatility_score,
            volume_score: record.volume_score,
            relative_strength_score: record.relative_strength_score,
            technical_composite: record.technical_composite,
            technical_quality: record.technical_quality,
            technical_status: record.technical_status.as_str().to_string(),
            technical_error: record.technical_error.clone(),
            valuation_score: record.valuation_score,
            growth_score: record.growth_score,
            profitability_score: record.profitability_score,
            leverage_score: record.leverage_score,
            cash_flow_score: record.cash_flow_score,
            fundamental_composite: record.fundamental_composite,
            fundamental_quality: record.fundamental_quality,
            fundamental_status: record.fundamental_status.as_str().to_string(),
            fundamental_error: record.fundamental_error.clone(),
            consensus_score: record.consensus_score,
            price_target_score: record.price_target_score,
            revision_score: record.revision_score,
            surprise_score: record.surprise_score,
            analyst_composite: record.analyst_composite,
            analyst_quality: record.analyst_quality,
            analyst_status: record.analyst_status.as_str().to_string(),
            analyst_error: record.analyst_error.clone(),
            overall_score: record.overall_score,
            created_at: record.created_at,
        }
    }
}

impl From<&ScoreRecord> for CurrentScoreRowDb {
    fn from(record: &ScoreRecord) -> Self {
        let row = ScoreRowDb::from(record);
        Self {
            ticker: row.ticker,
            calculation_date: row.calculation_date,
            momentum_score: row.momentum_score,
            trend_score: row.trend_score,
            volatility_score: row.volatility_score,
            volume_score: row.volume_score,
            relative_strength_score: row.relative_strength_score,
            technical_composite: row.technical_composite,
            technical_quality: row.technical_quality,
            technical_status: row.technical_status,
            technical_error: row.technical_error,
            valuation_score: row.valuation_score,
            growth_score: row.growth_score,
            profitability_score: row.profitability_score,
            leverage_score: row.leverage_score,
            cash_flow_score: row.cash_flow_score,
            fundamental_composite: row.fundamental_composite,
            fundamental_quality: row.fundamental_quality,
            fundamental_status: row.fundamental_status,
            fundamental_error: row.fundamental_error,
            consensus_score: row.consensus_score,
            price_target_score: row.price_target_score,
            revision_score: row.revision_score,
            surprise_score: row.surprise_score,
            analyst_composite: row.analyst_composite,
            analyst_quality: row.analyst_quality,
            analyst_status: row.analyst_status,
            analyst_error: row.analyst_error,
            overall_score: row.overall_score,
            created_at: row.created_at,
        }
    }
}

impl From<ScoreRowDb> for ScoreRecord {
    fn from(row: ScoreRowDb) -> Self {
        Self {
            ticker: row.ticker,
            calculation_date: row.calculation_date,
            momentum_score: row.momentum_score,
            trend_score: row.trend_score,
            volatility_score: row.volatility_score,
            volume_score: row.volume_score,
            relative_strength_score: row.relative_strength_score,
            technical_composite: row.technical_composite,
            technical_quality: row.technical_quality,
            technical_status: CalculationStatus::from(row.technical_status.as_str()),
            technical_error: row.technical_error,
            valuation_score: row.valuation_score,
            growth_score: row.growth_score,
            profitability_score: row.profitability_score,
            leverage_score: row.leverage_score,
            cash_flow_score: row.cash_flow_score,
            fundamental_composite: row.fundamental_composite,
            fundamental_quality: row.fundamental_quality,
            fundamental_status: CalculationStatus::from(row.fundamental_status.as_str()),
            fundamental_error: row.fundamental_error,
            consensus_score: row.consensus_score,
            price_target_score: row.price_target_score,
            revision_score: row.revision_score,
            surprise_score: row.surprise_score,
            analyst_composite: row.analyst_composite,
            analyst_quality: row.analyst_quality,
            analyst_status: CalculationStatus::from(row.analyst_status.as_str()),
            analyst_error: row.analyst_error,
            overall_score: row.overall_score,
            created_at: row.created_at,
        }
    }
}
