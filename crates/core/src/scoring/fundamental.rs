//! Fundamental domain score computer.
//!
//! Normalizes the stored ratio snapshot into sub-scores. All ratios are
//! computed upstream from statements; nothing here divides by raw
//! statement values.

use super::inputs::FundamentalInputs;
use super::model::{CalculationStatus, FundamentalPartial};
use super::quality::{data_quality_score, status_for_quality};
use super::{clamp_score, mean_of, to_f64};

pub fn compute(inputs: &FundamentalInputs) -> FundamentalPartial {
    let (present, required) = inputs.field_presence();
    let data_quality = data_quality_score(present, required);
    let status = status_for_quality(data_quality);

    if status == CalculationStatus::Failed {
        return FundamentalPartial::failed(
            data_quality,
            format!(
                "insufficient fundamental inputs: {}/{} required fields",
                present, required
            ),
        );
    }

    let valuation = valuation_score(inputs);
    let growth = growth_score(inputs);
    let profitability = profitability_score(inputs);
    let leverage = leverage_score(inputs);
    let cash_flow = cash_flow_score(inputs);

    let composite = mean_of(&[valuation, growth, profitability, leverage, cash_flow]);

    FundamentalPartial {
        valuation,
        growth,
        profitability,
        leverage,
        cash_flow,
        composite,
        data_quality,
        status,
        error: None,
    }
}

/// Cheapness on earnings and book multiples. A negative P/E (losses)
/// floors the earnings half at zero.
fn valuation_score(inputs: &FundamentalInputs) -> Option<f64> {
    let pe = to_f64(inputs.pe_ratio?);
    let pb = to_f64(inputs.price_to_book?);

    let pe_score = if pe <= 0.0 {
        0.0
    } else {
        clamp_score(100.0 - (pe - 5.0) * 2.5)
    };
    let pb_score = clamp_score(100.0 - (pb - 1.0) * 20.0);
    Some((pe_score + pb_score) / 2.0)
}

/// Revenue and EPS growth, each centered at 50 for flat.
fn growth_score(inputs: &FundamentalInputs) -> Option<f64> {
    let revenue = to_f64(inputs.revenue_growth?);
    let eps = to_f64(inputs.eps_growth?);

    let revenue_score = clamp_score(50.0 + revenue * 250.0);
    let eps_score = clamp_score(50.0 + eps * 250.0);
    Some((revenue_score + eps_score) / 2.0)
}

/// Return on equity and margins.
fn profitability_score(inputs: &FundamentalInputs) -> Option<f64> {
    let roe = to_f64(inputs.return_on_equity?);
    let gross = to_f64(inputs.gross_margin?);
    let operating = to_f64(inputs.operating_margin?);

    let roe_score = clamp_score(roe * 400.0);
    let gross_score = clamp_score(gross * 150.0);
    let operating_score = clamp_score(operating * 200.0);
    Some((roe_score + gross_score + operating_score) / 3.0)
}

/// Balance sheet safety. Negative debt-to-equity means negative equity
/// and scores zero on that half.
fn leverage_score(inputs: &FundamentalInputs) -> Option<f64> {
    let de = to_f64(inputs.debt_to_equity?);
    let current = to_f64(inputs.current_ratio?);

    let de_score = if de < 0.0 {
        0.0
    } else {
        clamp_score(100.0 - de * 40.0)
    };
    let current_score = clamp_score(current * 40.0);
    Some((de_score + current_score) / 2.0)
}

/// Free cash flow yield, centered at 50 for zero yield.
fn cash_flow_score(inputs: &FundamentalInputs) -> Option<f64> {
    let fcf_yield = to_f64(inputs.free_cash_flow_yield?);
    Some(clamp_score(50.0 + fcf_yield * 500.0))
}
