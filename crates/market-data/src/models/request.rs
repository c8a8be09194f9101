use serde::{Deserialize, Serialize};

use super::DataKind;

/// A single immutable unit of fetch work.
///
/// Created by the orchestration layer when populating a work queue and
/// consumed once by the router. `priority` is derived upstream from
/// earnings-date proximity: lower values are fetched sooner, tickers with
/// no known earnings date get [`FetchRequest::LOWEST_PRIORITY`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Ticker symbol, e.g. "AAPL".
    pub symbol: String,
    /// The data need this request represents.
    pub kind: DataKind,
    /// Queue priority; lower is sooner.
    pub priority: u32,
}

impl FetchRequest {
    /// Priority assigned when no earnings date is known.
    pub const LOWEST_PRIORITY: u32 = u32::MAX;

    pub fn new(symbol: impl Into<String>, kind: DataKind) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
            priority: Self::LOWEST_PRIORITY,
        }
    }

    /// Derive priority from days until the next earnings report.
    ///
    /// `None` (no known date) sorts after every known date.
    pub fn with_earnings_proximity(mut self, days_until_earnings: Option<u32>) -> Self {
        self.priority = days_until_earnings.unwrap_or(Self::LOWEST_PRIORITY);
        self
    }
}
