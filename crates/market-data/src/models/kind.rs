use serde::{Deserialize, Serialize};

/// The logical data needs the acquisition layer can route.
///
/// Providers declare which kinds they serve via
/// [`ProviderCapabilities`](crate::provider::ProviderCapabilities); the
/// router only considers providers whose declared kinds contain the
/// requested one.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Company profile: name, sector, industry, market cap.
    Profile,
    /// Latest price quote.
    Quote,
    /// Financial statement snapshot (ratios, margins, growth).
    FinancialStatement,
    /// Earnings calendar entry and estimate data.
    Earnings,
}

impl DataKind {
    /// Stable identifier used in logs and configuration keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Quote => "quote",
            Self::FinancialStatement => "financial_statement",
            Self::Earnings => "earnings",
        }
    }

    /// All kinds, in routing-table order.
    pub fn all() -> &'static [DataKind] {
        &[
            Self::Profile,
            Self::Quote,
            Self::FinancialStatement,
            Self::Earnings,
        ]
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
