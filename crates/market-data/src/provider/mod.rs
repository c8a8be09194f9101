//! Provider abstractions and transport implementations.
//!
//! This module contains:
//! - The `ProviderClient` trait that all data providers implement
//! - Provider capabilities and declared rate-limit constants
//! - Thin concrete transports (FMP, Finnhub)
//!
//! # Architecture
//!
//! The provider system is designed to be:
//! - **Provider-agnostic**: the router and quota tracker never know about
//!   specific vendors, only declared capabilities and limits
//! - **Extensible**: new vendors plug in by implementing `ProviderClient`
//! - **Honest about batching**: a provider without batch support declares
//!   `max_batch_size == 1` and the scheduler sizes groups accordingly

mod capabilities;
mod traits;

// Transport implementations
pub mod finnhub;
pub mod fmp;

// Re-exports
pub use capabilities::{ProviderCapabilities, ProviderLimits};
pub use traits::ProviderClient;
