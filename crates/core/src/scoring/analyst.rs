//! Analyst domain score computer.
//!
//! Normalizes consensus ratings, price targets, estimate revisions and
//! earnings surprises into sub-scores.

use super::inputs::AnalystInputs;
use super::model::{AnalystPartial, CalculationStatus};
use super::quality::{data_quality_score, status_for_quality};
use super::{clamp_score, mean_of, to_f64};

pub fn compute(inputs: &AnalystInputs) -> AnalystPartial {
    let (present, required) = inputs.field_presence();
    let data_quality = data_quality_score(present, required);
    let status = status_for_quality(data_quality);

    if status == CalculationStatus::Failed {
        return AnalystPartial::failed(
            data_quality,
            format!(
                "insufficient analyst inputs: {}/{} required fields",
                present, required
            ),
        );
    }

    let consensus = match consensus_score(inputs) {
        Ok(v) => v,
        Err(e) => return AnalystPartial::failed(data_quality, e),
    };
    let price_target = match target_upside_score(inputs) {
        Ok(v) => v,
        Err(e) => return AnalystPartial::failed(data_quality, e),
    };
    let revision = revision_score(inputs);
    let surprise = inputs
        .last_surprise_pct
        .map(|pct| clamp_score(50.0 + pct * 5.0));

    let composite = mean_of(&[consensus, price_target, revision, surprise]);

    AnalystPartial {
        consensus,
        price_target,
        revision,
        surprise,
        composite,
        data_quality,
        status,
        error: None,
    }
}

/// Weighted rating mix: strong buy 100, buy 75, hold 50, sell 0.
///
/// Zero total coverage cannot be normalized and fails the domain.
fn consensus_score(inputs: &AnalystInputs) -> Result<Option<f64>, String> {
    let (Some(strong_buy), Some(buy), Some(hold), Some(sell)) = (
        inputs.rating_strong_buy,
        inputs.rating_buy,
        inputs.rating_hold,
        inputs.rating_sell,
    ) else {
        return Ok(None);
    };

    let total = strong_buy + buy + hold + sell;
    if total == 0 {
        return Err("no analyst ratings in consensus calculation".to_string());
    }

    let weighted =
        (strong_buy as f64) * 100.0 + (buy as f64) * 75.0 + (hold as f64) * 50.0;
    Ok(Some(weighted / total as f64))
}

/// Upside to the mean price target, centered at 50 for no upside.
fn target_upside_score(inputs: &AnalystInputs) -> Result<Option<f64>, String> {
    let (Some(target), Some(price)) = (inputs.price_target_mean, inputs.price) else {
        return Ok(None);
    };
    if price.is_zero() {
        return Err("zero price in target upside calculation".to_string());
    }
    let upside = to_f64(target - price) / to_f64(price);
    Ok(Some(clamp_score(50.0 + upside * 200.0)))
}

/// Share of upward estimate revisions in the last 30 days.
///
/// No revisions at all is a meaningful zero and scores neutral.
fn revision_score(inputs: &AnalystInputs) -> Option<f64> {
    let up = inputs.eps_revisions_up_30d?;
    let down = inputs.eps_revisions_down_30d?;
    let total = up + down;
    if total == 0 {
        return Some(50.0);
    }
    Some((up as f64 / total as f64) * 100.0)
}
