// Table definitions for the score store.
//
// `scores_current` holds one mutable row per ticker (latest run wins);
// `scores_history` is the append/overwrite archive keyed by ticker and
// calculation date. Column order is identical in both tables so one row
// type can load from either.

diesel::table! {
    scores_current (ticker) {
        ticker -> Text,
        calculation_date -> Date,
        momentum_score -> Nullable<Double>,
        trend_score -> Nullable<Double>,
        volatility_score -> Nullable<Double>,
        volume_score -> Nullable<Double>,
        relative_strength_score -> Nullable<Double>,
        technical_composite -> Nullable<Double>,
        technical_quality -> Integer,
        technical_status -> Text,
        technical_error -> Nullable<Text>,
        valuation_score -> Nullable<Double>,
        growth_score -> Nullable<Double>,
        profitability_score -> Nullable<Double>,
        leverage_score -> Nullable<Double>,
        cash_flow_score -> Nullable<Double>,
        fundamental_composite -> Nullable<Double>,
        fundamental_quality -> Integer,
        fundamental_status -> Text,
        fundamental_error -> Nullable<Text>,
        consensus_score -> Nullable<Double>,
        price_target_score -> Nullable<Double>,
        revision_score -> Nullable<Double>,
        surprise_score -> Nullable<Double>,
        analyst_composite -> Nullable<Double>,
        analyst_quality -> Integer,
        analyst_status -> Text,
        analyst_error -> Nullable<Text>,
        overall_score -> Nullable<Double>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    scores_history (ticker, calculation_date) {
        ticker -> Text,
        calculation_date -> Date,
        momentum_score -> Nullable<Double>,
        trend_score -> Nullable<Double>,
        volatility_score -> Nullable<Double>,
        volume_score -> Nullable<Double>,
        relative_strength_score -> Nullable<Double>,
        technical_composite -> Nullable<Double>,
        technical_quality -> Integer,
        technical_status -> Text,
        technical_error -> Nullable<Text>,
        valuation_score -> Nullable<Double>,
        growth_score -> Nullable<Double>,
        profitability_score -> Nullable<Double>,
        leverage_score -> Nullable<Double>,
        cash_flow_score -> Nullable<Double>,
        fundamental_composite -> Nullable<Double>,
        fundamental_quality -> Integer,
        fundamental_status -> Text,
        fundamental_error -> Nullable<Text>,
        consensus_score -> Nullable<Double>,
        price_target_score -> Nullable<Double>,
        revision_score -> Nullable<Double>,
        surprise_score -> Nullable<Double>,
        analyst_composite -> Nullable<Double>,
        analyst_quality -> Integer,
        analyst_status -> Text,
        analyst_error -> Nullable<Text>,
        overall_score -> Nullable<Double>,
        created_at -> Timestamp,
    }
}

diesel::allow_tables_to_appear_in_same_query!(scores_current, scores_history);
