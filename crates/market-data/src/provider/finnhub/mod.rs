//! Finnhub transport.
//!
//! Fallback source for profiles, quotes and earnings. Finnhub has no
//! multi-symbol endpoints on the free tier, so every symbol costs one
//! call and `max_batch_size` is declared as 1.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::FetchError;
use crate::models::{
    CompanyProfile, DataKind, EarningsEvent, FetchPayload, FetchRequest, PriceQuote,
};
use crate::provider::{ProviderCapabilities, ProviderClient, ProviderLimits};

const BASE_URL: &str = "https://finnhub.io/api/v1";

const PROVIDER_ID: &str = "FINNHUB";

pub struct FinnhubProvider {
    client: Client,
    token: String,
}

impl FinnhubProvider {
    pub fn new(token: String) -> Self {
        FinnhubProvider {
            client: Client::new(),
            token,
        }
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(&str, &str)>,
    ) -> Result<T, FetchError> {
        let mut query = params;
        query.push(("token", &self.token));

        let url = reqwest::Url::parse_with_params(&format!("{}/{}", BASE_URL, path), &query)
            .map_err(|e| FetchError::TransportError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to build URL: {}", e),
            })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(PROVIDER_ID, e))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                provider: PROVIDER_ID.to_string(),
                retry_after: None,
            });
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetchError::TransportError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Finnhub API error {}: {}", status, body),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(PROVIDER_ID, e))?;

        serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct FinnhubProfile {
    name: Option<String>,
    #[serde(rename = "finnhubIndustry")]
    industry: Option<String>,
    #[serde(rename = "marketCapitalization")]
    market_cap: Option<Decimal>,
    exchange: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    /// Current price. Finnhub returns 0 for unknown symbols.
    c: Decimal,
    /// Previous close.
    pc: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct FinnhubEarnings {
    #[serde(rename = "earningsCalendar")]
    earnings_calendar: Vec<FinnhubEarningsEntry>,
}

#[derive(Debug, Deserialize)]
struct FinnhubEarningsEntry {
    date: Option<chrono::NaiveDate>,
    #[serde(rename = "epsEstimate")]
    eps_estimate: Option<Decimal>,
    #[serde(rename = "epsActual")]
    eps_actual: Option<Decimal>,
    #[serde(rename = "revenueEstimate")]
    revenue_estimate: Option<Decimal>,
}

#[async_trait]
impl ProviderClient for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            kinds: &[DataKind::Profile, DataKind::Quote, DataKind::Earnings],
            batch_kinds: &[],
            max_batch_size: 1,
        }
    }

    fn limits(&self) -> ProviderLimits {
        // Free tier is 60/min with no published daily cap; the daily
        // number here keeps a runaway loop from burning the account.
        ProviderLimits {
            daily_limit: 5000,
            per_minute_limit: 60,
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<FetchPayload, FetchError> {
        let symbol = request.symbol.as_str();

        match request.kind {
            DataKind::Profile => {
                let profile: FinnhubProfile = self
                    .fetch_json("stock/profile2", vec![("symbol", symbol)])
                    .await?;
                if profile.name.is_none() && profile.exchange.is_none() {
                    return Err(FetchError::SymbolNotFound(symbol.to_string()));
                }
                Ok(FetchPayload::Profile(CompanyProfile {
                    symbol: symbol.to_string(),
                    name: profile.name,
                    sector: None,
                    industry: profile.industry,
                    market_cap: profile.market_cap,
                    exchange: profile.exchange,
                }))
            }
            DataKind::Quote => {
                let quote: FinnhubQuote =
                    self.fetch_json("quote", vec![("symbol", symbol)]).await?;
                if quote.c == Decimal::ZERO {
                    return Err(FetchError::SymbolNotFound(symbol.to_string()));
                }
                Ok(FetchPayload::Quote(PriceQuote {
                    symbol: symbol.to_string(),
                    price: quote.c,
                    previous_close: quote.pc,
                    volume: None,
                    as_of: Utc::now().date_naive(),
                }))
            }
            DataKind::Earnings => {
                let calendar: FinnhubEarnings = self
                    .fetch_json("calendar/earnings", vec![("symbol", symbol)])
                    .await?;
                let entry = calendar
                    .earnings_calendar
                    .into_iter()
                    .next()
                    .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))?;
                Ok(FetchPayload::Earnings(EarningsEvent {
                    symbol: symbol.to_string(),
                    report_date: entry.date,
                    eps_estimate: entry.eps_estimate,
                    eps_actual: entry.eps_actual,
                    revenue_estimate: entry.revenue_estimate,
                }))
            }
            other => Err(FetchError::UnsupportedKind {
                provider: PROVIDER_ID.to_string(),
                kind: other,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_are_single_only() {
        let provider = FinnhubProvider::new("test-key".to_string());
        let caps = provider.capabilities();
        assert!(caps.supports(DataKind::Quote));
        assert!(!caps.supports(DataKind::FinancialStatement));
        assert_eq!(caps.max_batch_size, 1);
        assert!(!caps.supports_batch_for(DataKind::Quote));
    }

    #[test]
    fn test_quote_shape_parses() {
        let json = r#"{"c":187.44,"h":189.2,"l":186.3,"o":188.0,"pc":185.01,"t":1714752000}"#;
        let quote: FinnhubQuote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.c.to_string(), "187.44");
        assert_eq!(quote.pc.unwrap().to_string(), "185.01");
    }

    #[test]
    fn test_earnings_calendar_shape_parses() {
        let json = r#"{"earningsCalendar":[{"date":"2024-05-02","epsActual":1.53,"epsEstimate":1.50,"revenueEstimate":90000000000}]}"#;
        let calendar: FinnhubEarnings = serde_json::from_str(json).unwrap();
        assert_eq!(calendar.earnings_calendar.len(), 1);
        assert!(calendar.earnings_calendar[0].date.is_some());
    }
}
