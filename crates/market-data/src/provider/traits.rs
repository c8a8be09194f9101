//! Provider client trait definition.
//!
//! This module defines the core `ProviderClient` trait that all data
//! providers must implement.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::{DataKind, FetchPayload, FetchRequest};

use super::capabilities::{ProviderCapabilities, ProviderLimits};

/// Trait for external financial-data providers.
///
/// Implement this trait to add support for a new data source. The router
/// uses the declared capabilities and limits to decide when and how to
/// call it; transports never consult the quota tracker themselves.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use marketscore_market_data::provider::{ProviderClient, ProviderCapabilities, ProviderLimits};
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl ProviderClient for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities {
///             kinds: &[DataKind::Quote],
///             max_batch_size: 1,
///         }
///     }
///
///     fn limits(&self) -> ProviderLimits {
///         ProviderLimits::default()
///     }
///
///     // ... implement fetch
/// }
/// ```
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "FMP", "FINNHUB", etc.
    /// Used for logging, quota tracking, and priority configuration.
    fn id(&self) -> &'static str;

    /// Describes which data kinds this provider serves and its maximum
    /// batch size.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Declared rate-limit constants for this provider.
    ///
    /// The quota tracker enforces these; a transport must not exceed them
    /// on its own initiative.
    fn limits(&self) -> ProviderLimits;

    /// Fetch data for a single symbol.
    ///
    /// # Arguments
    ///
    /// * `request` - The fetch request (symbol + data kind)
    ///
    /// # Returns
    ///
    /// The typed payload on success, or a [`FetchError`] classified for
    /// the router's retry/fallback handling.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchPayload, FetchError>;

    /// Fetch data for several symbols in one provider call.
    ///
    /// The caller guarantees `symbols.len() <= capabilities().max_batch_size`.
    /// Symbols absent from the returned map were not served by the
    /// provider (unknown ticker, no data) and are handled by the caller.
    ///
    /// Default implementation reports no batch support.
    async fn fetch_batch(
        &self,
        symbols: &[String],
        kind: DataKind,
    ) -> Result<HashMap<String, FetchPayload>, FetchError> {
        let _ = symbols;
        Err(FetchError::UnsupportedKind {
            provider: self.id().to_string(),
            kind,
        })
    }
}
