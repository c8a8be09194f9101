use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DataKind;

/// Company profile data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<Decimal>,
    pub exchange: Option<String>,
}

/// Latest price quote for a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: Decimal,
    pub previous_close: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub as_of: NaiveDate,
}

/// Snapshot of fundamental ratios from the most recent statements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub symbol: String,
    pub pe_ratio: Option<Decimal>,
    pub price_to_book: Option<Decimal>,
    pub debt_to_equity: Option<Decimal>,
    pub return_on_equity: Option<Decimal>,
    pub revenue_growth: Option<Decimal>,
    pub gross_margin: Option<Decimal>,
    pub free_cash_flow: Option<Decimal>,
}

/// One earnings calendar entry with estimate context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EarningsEvent {
    pub symbol: String,
    pub report_date: Option<NaiveDate>,
    pub eps_estimate: Option<Decimal>,
    pub eps_actual: Option<Decimal>,
    pub revenue_estimate: Option<Decimal>,
}

/// A typed payload returned by a provider fetch.
///
/// The variant always matches the [`DataKind`] of the request that produced
/// it; [`FetchPayload::kind`] recovers that kind for sinks that dispatch on
/// it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchPayload {
    Profile(CompanyProfile),
    Quote(PriceQuote),
    FinancialStatement(FinancialSnapshot),
    Earnings(EarningsEvent),
}

impl FetchPayload {
    pub fn kind(&self) -> DataKind {
        match self {
            Self::Profile(_) => DataKind::Profile,
            Self::Quote(_) => DataKind::Quote,
            Self::FinancialStatement(_) => DataKind::FinancialStatement,
            Self::Earnings(_) => DataKind::Earnings,
        }
    }

    /// The symbol this payload describes.
    pub fn symbol(&self) -> &str {
        match self {
            Self::Profile(p) => &p.symbol,
            Self::Quote(q) => &q.symbol,
            Self::FinancialStatement(s) => &s.symbol,
            Self::Earnings(e) => &e.symbol,
        }
    }
}
