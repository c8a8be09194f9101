//! Financial Modeling Prep transport.
//!
//! Primary source for profiles, quotes, financial snapshots and earnings.
//! The quote endpoint accepts up to 100 comma-joined symbols per call,
//! which is what keeps daily quota usage tractable for large universes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::FetchError;
use crate::models::{
    CompanyProfile, DataKind, EarningsEvent, FetchPayload, FetchRequest, FinancialSnapshot,
    PriceQuote,
};
use crate::provider::{ProviderCapabilities, ProviderClient, ProviderLimits};

const BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

const PROVIDER_ID: &str = "FMP";

/// Free-tier quote batch cap.
const MAX_BATCH: usize = 100;

pub struct FmpProvider {
    client: Client,
    token: String,
}

impl FmpProvider {
    pub fn new(token: String) -> Self {
        FmpProvider {
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
        query.push(("apikey", &self.token));

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

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(std::time::Duration::from_secs);
                return Err(FetchError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                    retry_after,
                });
            }
            StatusCode::NOT_FOUND => {
                return Err(FetchError::TransportError {
                    provider: PROVIDER_ID.to_string(),
                    message: "endpoint not found".to_string(),
                });
            }
            status if !status.is_success() => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(FetchError::TransportError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("FMP API error {}: {}", status, body),
                });
            }
            _ => {}
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
struct FmpProfile {
    symbol: String,
    #[serde(rename = "companyName")]
    company_name: Option<String>,
    sector: Option<String>,
    industry: Option<String>,
    #[serde(rename = "mktCap")]
    market_cap: Option<Decimal>,
    #[serde(rename = "exchangeShortName")]
    exchange: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FmpQuote {
    symbol: String,
    price: Decimal,
    #[serde(rename = "previousClose")]
    previous_close: Option<Decimal>,
    volume: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct FmpRatios {
    #[serde(rename = "peRatioTTM")]
    pe_ratio: Option<Decimal>,
    #[serde(rename = "priceToBookRatioTTM")]
    price_to_book: Option<Decimal>,
    #[serde(rename = "debtEquityRatioTTM")]
    debt_to_equity: Option<Decimal>,
    #[serde(rename = "returnOnEquityTTM")]
    return_on_equity: Option<Decimal>,
    #[serde(rename = "revenueGrowthTTM")]
    revenue_growth: Option<Decimal>,
    #[serde(rename = "grossProfitMarginTTM")]
    gross_margin: Option<Decimal>,
    #[serde(rename = "freeCashFlowPerShareTTM")]
    free_cash_flow: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct FmpEarnings {
    symbol: String,
    date: Option<NaiveDate>,
    #[serde(rename = "epsEstimated")]
    eps_estimate: Option<Decimal>,
    eps: Option<Decimal>,
    #[serde(rename = "revenueEstimated")]
    revenue_estimate: Option<Decimal>,
}

impl From<FmpProfile> for CompanyProfile {
    fn from(p: FmpProfile) -> Self {
        CompanyProfile {
            symbol: p.symbol,
            name: p.company_name,
            sector: p.sector,
            industry: p.industry,
            market_cap: p.market_cap,
            exchange: p.exchange,
        }
    }
}

impl From<FmpQuote> for PriceQuote {
    fn from(q: FmpQuote) -> Self {
        PriceQuote {
            symbol: q.symbol,
            price: q.price,
            previous_close: q.previous_close,
            volume: q.volume,
            as_of: Utc::now().date_naive(),
        }
    }
}

#[async_trait]
impl ProviderClient for FmpProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            kinds: &[
                DataKind::Profile,
                DataKind::Quote,
                DataKind::FinancialStatement,
                DataKind::Earnings,
            ],
            batch_kinds: &[DataKind::Profile, DataKind::Quote],
            max_batch_size: MAX_BATCH,
        }
    }

    fn limits(&self) -> ProviderLimits {
        ProviderLimits {
            daily_limit: 250,
            per_minute_limit: 30,
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<FetchPayload, FetchError> {
        let symbol = request.symbol.as_str();

        match request.kind {
            DataKind::Profile => {
                let rows: Vec<FmpProfile> =
                    self.fetch_json(&format!("profile/{}", symbol), vec![]).await?;
                let profile = rows
                    .into_iter()
                    .next()
                    .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))?;
                Ok(FetchPayload::Profile(profile.into()))
            }
            DataKind::Quote => {
                let rows: Vec<FmpQuote> =
                    self.fetch_json(&format!("quote/{}", symbol), vec![]).await?;
                let quote = rows
                    .into_iter()
                    .next()
                    .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))?;
                Ok(FetchPayload::Quote(quote.into()))
            }
            DataKind::FinancialStatement => {
                let rows: Vec<FmpRatios> = self
                    .fetch_json(&format!("ratios-ttm/{}", symbol), vec![])
                    .await?;
                let ratios = rows
                    .into_iter()
                    .next()
                    .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))?;
                Ok(FetchPayload::FinancialStatement(FinancialSnapshot {
                    symbol: symbol.to_string(),
                    pe_ratio: ratios.pe_ratio,
                    price_to_book: ratios.price_to_book,
                    debt_to_equity: ratios.debt_to_equity,
                    return_on_equity: ratios.return_on_equity,
                    revenue_growth: ratios.revenue_growth,
                    gross_margin: ratios.gross_margin,
                    free_cash_flow: ratios.free_cash_flow,
                }))
            }
            DataKind::Earnings => {
                let rows: Vec<FmpEarnings> = self
                    .fetch_json("earning_calendar", vec![("symbol", symbol)])
                    .await?;
                let event = rows
                    .into_iter()
                    .next()
                    .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))?;
                Ok(FetchPayload::Earnings(EarningsEvent {
                    symbol: event.symbol,
                    report_date: event.date,
                    eps_estimate: event.eps_estimate,
                    eps_actual: event.eps,
                    revenue_estimate: event.revenue_estimate,
                }))
            }
        }
    }

    async fn fetch_batch(
        &self,
        symbols: &[String],
        kind: DataKind,
    ) -> Result<HashMap<String, FetchPayload>, FetchError> {
        // Only the quote and profile endpoints accept comma-joined symbols;
        // the router sends other kinds through `fetch` one symbol at a time.
        let joined = symbols.join(",");
        match kind {
            DataKind::Quote => {
                let rows: Vec<FmpQuote> =
                    self.fetch_json(&format!("quote/{}", joined), vec![]).await?;
                Ok(rows
                    .into_iter()
                    .map(|q| (q.symbol.clone(), FetchPayload::Quote(q.into())))
                    .collect())
            }
            DataKind::Profile => {
                let rows: Vec<FmpProfile> = self
                    .fetch_json(&format!("profile/{}", joined), vec![])
                    .await?;
                Ok(rows
                    .into_iter()
                    .map(|p| (p.symbol.clone(), FetchPayload::Profile(p.into())))
                    .collect())
            }
            other => Err(FetchError::UnsupportedKind {
                provider: PROVIDER_ID.to_string(),
                kind: other,
            }),
        }
    }
}
