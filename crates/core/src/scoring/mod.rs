//! Score computation and orchestration.
//!
//! This module contains:
//! - The per-domain score computers (technical, fundamental, analyst),
//!   pure functions over already-persisted raw data
//! - Shared data quality grading
//! - The run orchestrator that fans ticker work across a bounded pool
//!
//! The exact sub-score normalizations are policy: clamped linear maps
//! chosen to spread typical values across 0-100. They are deliberately
//! simple; what matters structurally is that every computer grades its
//! inputs, never panics, and reports failure inside its partial instead
//! of propagating it.

pub mod analyst;
pub mod fundamental;
pub mod inputs;
pub mod model;
pub mod orchestrator;
pub mod quality;
pub mod technical;

pub use inputs::{
    AnalystInputs, EarningsCalendar, FundamentalInputs, RawInputStore, TechnicalInputs,
};
pub use model::{
    AnalystPartial, CalculationStatus, FundamentalPartial, ScoreRecord, TechnicalPartial,
    TickerOutcome,
};
pub use orchestrator::{OrchestratorConfig, RunState, RunSummary, ScoreOrchestrator};

use num_traits::ToPrimitive;
use rust_decimal::Decimal;

/// Clamp into score space.
pub(crate) fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Decimal to f64 for score arithmetic.
pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Mean of the sub-scores that were computable.
pub(crate) fn mean_of(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().copied().flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}
