//! Technical domain score computer.
//!
//! Pure function over the latest indicator snapshot; no network or
//! database access. Indicator math (RSI, MACD, moving averages) happens
//! upstream in the collection pipeline; this computer only normalizes
//! the stored values into sub-scores.

use super::inputs::TechnicalInputs;
use super::model::{CalculationStatus, TechnicalPartial};
use super::quality::{data_quality_score, status_for_quality};
use super::{clamp_score, mean_of, to_f64};

pub fn compute(inputs: &TechnicalInputs) -> TechnicalPartial {
    let (present, required) = inputs.field_presence();
    let data_quality = data_quality_score(present, required);
    let status = status_for_quality(data_quality);

    if status == CalculationStatus::Failed {
        return TechnicalPartial::failed(
            data_quality,
            format!(
                "insufficient technical inputs: {}/{} required fields",
                present, required
            ),
        );
    }

    let momentum = inputs.rsi_14.map(clamp_score);
    let trend = trend_score(inputs);
    let volatility = match volatility_score(inputs) {
        Ok(v) => v,
        Err(e) => return TechnicalPartial::failed(data_quality, e),
    };
    let volume = match volume_score(inputs) {
        Ok(v) => v,
        Err(e) => return TechnicalPartial::failed(data_quality, e),
    };
    let relative_strength = match range_position(inputs) {
        Ok(v) => v,
        Err(e) => return TechnicalPartial::failed(data_quality, e),
    };

    let composite = mean_of(&[momentum, trend, volatility, volume, relative_strength]);

    TechnicalPartial {
        momentum,
        trend,
        volatility,
        volume,
        relative_strength,
        composite,
        data_quality,
        status,
        error: None,
    }
}

/// 25 points per bullish alignment: close above each moving average,
/// MACD above its signal line.
fn trend_score(inputs: &TechnicalInputs) -> Option<f64> {
    let close = inputs.close?;
    let sma_20 = inputs.sma_20?;
    let sma_50 = inputs.sma_50?;
    let sma_200 = inputs.sma_200?;
    let macd = inputs.macd?;
    let signal = inputs.macd_signal?;

    let mut score = 0.0;
    if close > sma_20 {
        score += 25.0;
    }
    if close > sma_50 {
        score += 25.0;
    }
    if close > sma_200 {
        score += 25.0;
    }
    if macd > signal {
        score += 25.0;
    }
    Some(score)
}

/// Calmness of the price relative to its 20-day mean: zero drift scores
/// 100, a 20% drift scores 0.
fn volatility_score(inputs: &TechnicalInputs) -> Result<Option<f64>, String> {
    let (Some(close), Some(sma_20)) = (inputs.close, inputs.sma_20) else {
        return Ok(None);
    };
    if sma_20.is_zero() {
        return Err("zero 20-day moving average in volatility calculation".to_string());
    }
    let drift = (to_f64(close) / to_f64(sma_20) - 1.0).abs();
    Ok(Some(clamp_score(100.0 - drift * 500.0)))
}

/// Current volume against the 20-day average; 1x average is 50.
fn volume_score(inputs: &TechnicalInputs) -> Result<Option<f64>, String> {
    let (Some(volume), Some(avg)) = (inputs.volume, inputs.avg_volume_20) else {
        return Ok(None);
    };
    if avg.is_zero() {
        return Err("zero average volume in volume trend calculation".to_string());
    }
    let ratio = to_f64(volume) / to_f64(avg);
    Ok(Some(clamp_score(ratio * 50.0)))
}

/// Position of the close within the 52-week range.
fn range_position(inputs: &TechnicalInputs) -> Result<Option<f64>, String> {
    let (Some(close), Some(high), Some(low)) = (inputs.close, inputs.high_52w, inputs.low_52w)
    else {
        return Ok(None);
    };
    let range = high - low;
    if range.is_zero() {
        return Err("zero 52-week range in relative strength calculation".to_string());
    }
    if range < rust_decimal::Decimal::ZERO {
        return Err("inverted 52-week range in relative strength calculation".to_string());
    }
    let position = (to_f64(close) - to_f64(low)) / to_f64(range) * 100.0;
    Ok(Some(clamp_score(position)))
}
