//! Error types and retry classification for the acquisition layer.
//!
//! This module provides:
//! - [`FetchError`]: The main error enum for all provider fetch operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use std::time::Duration;

use thiserror::Error;

use crate::models::DataKind;

/// Errors that can occur while fetching data from a provider.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which determines how the
/// router handles the error: retry the same provider with backoff, fall
/// through to the next candidate, or give up on the request entirely.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The provider signaled quota/backpressure (HTTP 429 or equivalent).
    /// Retry with exponential backoff, honoring the hint when present.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
        /// Server-suggested wait before retrying, if the provider sent one
        retry_after: Option<Duration>,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// Network or provider-side failure that another provider may not share.
    #[error("Transport error: {provider} - {message}")]
    TransportError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The requested symbol was not found by the provider.
    /// Retrying the same provider won't help.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider does not serve the requested data kind.
    #[error("Kind {kind} not supported by provider: {provider}")]
    UnsupportedKind {
        /// The provider that refused the request
        provider: String,
        /// The requested kind
        kind: DataKind,
    },

    /// The provider responded but the body could not be interpreted.
    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse {
        /// The provider that returned the body
        provider: String,
        /// Description of the parse failure
        message: String,
    },

    /// The tracker reports no quota left for this provider today.
    /// The router skips the provider without issuing a call.
    #[error("Quota exhausted: {provider}")]
    QuotaExhausted {
        /// The provider with no remaining quota
        provider: String,
    },

    /// No registered provider supports the requested data kind.
    #[error("No providers available for {kind}")]
    NoProvidersAvailable {
        /// The kind nothing can serve
        kind: DataKind,
    },

    /// Every candidate provider was tried and all failed.
    /// Carries the last underlying error text for diagnostics.
    #[error("All providers failed for {kind}: {last}")]
    AllProvidersFailed {
        /// The requested kind
        kind: DataKind,
        /// Display form of the last error seen
        last: String,
    },
}

impl FetchError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::WithBackoff`]: retry the same provider, bounded
    ///   exponential backoff, then fall through
    /// - [`RetryClass::NextProvider`]: fall through immediately, no retry
    /// - [`RetryClass::Never`]: terminal for this provider and request
    ///
    /// # Examples
    ///
    /// ```
    /// use marketscore_market_data::errors::{FetchError, RetryClass};
    ///
    /// let error = FetchError::Timeout { provider: "FMP".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = FetchError::SymbolNotFound("INVALID".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Backpressure and flakiness - retry the same provider first
            Self::RateLimited { .. } | Self::Timeout { .. } => RetryClass::WithBackoff,

            // Provider-specific failures - another provider may succeed
            Self::TransportError { .. } | Self::MalformedResponse { .. } => {
                RetryClass::NextProvider
            }

            // Permanent for this provider - skip ahead without retry
            Self::SymbolNotFound(_) | Self::UnsupportedKind { .. } | Self::QuotaExhausted { .. } => {
                RetryClass::Never
            }

            // Exhausted all options - terminal
            Self::NoProvidersAvailable { .. } | Self::AllProvidersFailed { .. } => {
                RetryClass::Never
            }
        }
    }

    /// Map a reqwest transport failure onto the taxonomy.
    pub fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else {
            Self::TransportError {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        }
    }
}
