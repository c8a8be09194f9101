//! Marketscore Market Data Crate
//!
//! This crate provides the rate-limited, multi-provider acquisition layer
//! for the marketscore scoring pipeline.
//!
//! # Overview
//!
//! The acquisition layer supports:
//! - Multiple data kinds: profiles, quotes, financial snapshots, earnings
//! - Multiple providers behind one trait, with declared capabilities
//! - Per-provider daily and per-minute quota tracking
//! - Batch planning sized to each provider's batch endpoint
//! - Priority-ordered fallback with bounded retry and backoff
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   Ticker list    | --> |    BatchPlan     |  (provider-sized groups)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |  ProviderRouter  |  (priority + fallback)
//!                          +------------------+
//!                             |            |
//!                             v            v
//!                   +--------------+  +--------------+
//!                   | QuotaTracker |  | ProviderClient| (FMP, Finnhub, ...)
//!                   +--------------+  +--------------+
//!                                          |
//!                                          v
//!                                  +--------------+
//!                                  | FetchPayload |  (typed raw data)
//!                                  +--------------+
//! ```
//!
//! # Core Types
//!
//! - [`DataKind`] - The logical data needs the router can serve
//! - [`FetchRequest`] - One immutable unit of fetch work
//! - [`FetchPayload`] - Typed payload returned by a provider
//! - [`ProviderClient`] - The trait every provider implements
//! - [`QuotaTracker`] - Shared per-provider call accounting
//! - [`ProviderRouter`] - Priority-ordered fallback routing
//! - [`BatchPlan`] - Deterministic symbol grouping

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;

// Re-export all public types from models
pub use models::{
    CompanyProfile, DataKind, EarningsEvent, FetchPayload, FetchRequest, FinancialSnapshot,
    PriceQuote, ProviderId,
};

// Re-export error types
pub use errors::{FetchError, RetryClass};

// Re-export provider types
pub use provider::finnhub::FinnhubProvider;
pub use provider::fmp::FmpProvider;
pub use provider::{ProviderCapabilities, ProviderClient, ProviderLimits};

// Re-export registry types
pub use registry::{BatchOutcome, BatchPlan, FetchBatch, ProviderRouter, QuotaTracker, QuotaUsage, RouterConfig};
