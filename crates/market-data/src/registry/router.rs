//! Provider routing with quota-aware fallback.
//!
//! The router owns the candidate walk for a fetch request:
//! - Filter providers by declared data-kind support
//! - Order by the configured priority table
//! - Gate every call on the shared quota tracker
//! - Retry transient failures on the same provider with bounded backoff
//! - Fall through to the next candidate on anything else
//!
//! Provider-level errors terminate here; callers only ever see a final
//! `Result`, never an in-flight provider failure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;

use super::quota::QuotaTracker;
use crate::errors::{FetchError, RetryClass};
use crate::models::{DataKind, FetchPayload, FetchRequest};
use crate::provider::ProviderClient;

/// Router behavior knobs.
///
/// `priorities` maps provider ids onto ranks (lower tried first);
/// providers absent from the table keep registration order after all
/// ranked ones. Priority is configuration, never per-request logic.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Provider id -> rank; lower ranks are tried first.
    pub priorities: HashMap<String, u8>,
    /// Attempts per provider per request for backoff-class errors.
    pub max_attempts: u32,
    /// First backoff delay; doubles per retry.
    pub initial_backoff: Duration,
    /// Cap on total backoff sleep per provider per request.
    pub max_total_backoff: Duration,
    /// Longest quota wait worth sleeping through. A provider whose
    /// next slot is further away is skipped, not waited for.
    pub max_quota_wait: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            priorities: HashMap::new(),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_total_backoff: Duration::from_secs(5),
            max_quota_wait: Duration::from_secs(2),
        }
    }
}

/// Result of routing a batch: per-symbol payloads plus per-symbol
/// failures. A batch never fails wholesale once at least one candidate
/// exists; unsatisfied symbols are enumerated instead.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub payloads: HashMap<String, FetchPayload>,
    /// (symbol, last error text) for symbols no candidate served.
    pub failures: Vec<(String, String)>,
}

/// Quota-aware provider router.
pub struct ProviderRouter {
    providers: Vec<Arc<dyn ProviderClient>>,
    quota: Arc<QuotaTracker>,
    config: RouterConfig,
}

impl ProviderRouter {
    /// Create a router over `providers`, registering each provider's
    /// declared limits with the shared tracker.
    pub fn new(
        providers: Vec<Arc<dyn ProviderClient>>,
        quota: Arc<QuotaTracker>,
        config: RouterConfig,
    ) -> Self {
        for provider in &providers {
            quota.configure(provider.id(), provider.limits());
        }
        Self {
            providers,
            quota,
            config,
        }
    }

    /// The registered providers.
    pub fn providers(&self) -> &[Arc<dyn ProviderClient>] {
        &self.providers
    }

    /// Highest-priority provider supporting `kind`, if any.
    ///
    /// Callers use this to size batches before planning.
    pub fn primary_for(&self, kind: DataKind) -> Option<&Arc<dyn ProviderClient>> {
        self.ordered_candidates(kind).into_iter().next()
    }

    /// Fetch data for a single request, walking candidates in priority
    /// order until one succeeds.
    pub async fn route(&self, request: &FetchRequest) -> Result<FetchPayload, FetchError> {
        let candidates = self.ordered_candidates(request.kind);

        if candidates.is_empty() {
            warn!("No providers available for kind: {}", request.kind);
            return Err(FetchError::NoProvidersAvailable { kind: request.kind });
        }

        let mut last_error: Option<FetchError> = None;

        for provider in candidates {
            match self.try_provider(provider.as_ref(), request).await {
                Ok(payload) => return Ok(payload),
                Err(e) => {
                    self.log_fallthrough(provider.id(), &e);
                    last_error = Some(e);
                }
            }
        }

        Err(FetchError::AllProvidersFailed {
            kind: request.kind,
            last: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no provider attempted".to_string()),
        })
    }

    /// Fetch data for a group of symbols.
    ///
    /// Batch-capable candidates take the whole remaining set in
    /// provider-sized chunks; single-only candidates sweep the remainder
    /// one symbol at a time. Symbols a candidate cannot serve carry over
    /// to the next candidate; whatever is left at the end is reported in
    /// [`BatchOutcome::failures`].
    pub async fn route_batch(
        &self,
        symbols: &[String],
        kind: DataKind,
    ) -> Result<BatchOutcome, FetchError> {
        let candidates = self.ordered_candidates(kind);

        if candidates.is_empty() {
            warn!("No providers available for kind: {}", kind);
            return Err(FetchError::NoProvidersAvailable { kind });
        }

        let mut outcome = BatchOutcome::default();
        let mut remaining: Vec<String> = symbols.to_vec();
        let mut last_error = String::from("all providers failed");

        for provider in candidates {
            if remaining.is_empty() {
                break;
            }

            let caps = provider.capabilities();
            remaining = if caps.supports_batch_for(kind) {
                self.sweep_batched(
                    provider.as_ref(),
                    &remaining,
                    kind,
                    caps.max_batch_size,
                    &mut outcome,
                    &mut last_error,
                )
                .await
            } else {
                self.sweep_singles(
                    provider.as_ref(),
                    &remaining,
                    kind,
                    &mut outcome,
                    &mut last_error,
                )
                .await
            };
        }

        for symbol in remaining {
            outcome.failures.push((symbol, last_error.clone()));
        }

        info!(
            "Batch route for {}: {} fetched, {} failed",
            kind,
            outcome.payloads.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }

    /// Run one candidate against the remaining symbols via its batch
    /// endpoint. Returns the symbols still unserved.
    async fn sweep_batched(
        &self,
        provider: &dyn ProviderClient,
        remaining: &[String],
        kind: DataKind,
        max_batch_size: usize,
        outcome: &mut BatchOutcome,
        last_error: &mut String,
    ) -> Vec<String> {
        let mut unserved = Vec::new();

        for chunk in remaining.chunks(max_batch_size.max(1)) {
            match self.try_provider_batch(provider, chunk, kind).await {
                Ok(map) => {
                    // Symbols the provider silently omitted move on to
                    // the next candidate.
                    for symbol in chunk {
                        if !map.contains_key(symbol) {
                            unserved.push(symbol.clone());
                        }
                    }
                    outcome.payloads.extend(map);
                }
                Err(e) => {
                    self.log_fallthrough(provider.id(), &e);
                    *last_error = e.to_string();
                    unserved.extend(chunk.iter().cloned());
                    if matches!(e, FetchError::QuotaExhausted { .. }) {
                        // No point issuing further chunks to this provider.
                        let already: std::collections::HashSet<String> =
                            unserved.iter().cloned().collect();
                        unserved.extend(
                            remaining
                                .iter()
                                .filter(|s| {
                                    !outcome.payloads.contains_key(*s) && !already.contains(*s)
                                })
                                .cloned(),
                        );
                        break;
                    }
                }
            }
        }

        unserved
    }

    /// Run one single-only candidate over the remaining symbols.
    /// Returns the symbols still unserved.
    async fn sweep_singles(
        &self,
        provider: &dyn ProviderClient,
        remaining: &[String],
        kind: DataKind,
        outcome: &mut BatchOutcome,
        last_error: &mut String,
    ) -> Vec<String> {
        let mut unserved = Vec::new();

        for (position, symbol) in remaining.iter().enumerate() {
            let request = FetchRequest::new(symbol.clone(), kind);
            match self.try_provider(provider, &request).await {
                Ok(payload) => {
                    outcome.payloads.insert(symbol.clone(), payload);
                }
                Err(e) => {
                    self.log_fallthrough(provider.id(), &e);
                    *last_error = e.to_string();
                    unserved.push(symbol.clone());
                    if matches!(e, FetchError::QuotaExhausted { .. }) {
                        unserved.extend(remaining[position + 1..].iter().cloned());
                        break;
                    }
                }
            }
        }

        unserved
    }

    /// Attempt a single-symbol fetch against one provider, with quota
    /// gating and bounded retries for backoff-class errors.
    async fn try_provider(
        &self,
        provider: &dyn ProviderClient,
        request: &FetchRequest,
    ) -> Result<FetchPayload, FetchError> {
        let id = provider.id();
        let mut backoff = self.config.initial_backoff;
        let mut slept = Duration::ZERO;
        let mut attempt = 1;

        loop {
            self.acquire_quota(id).await?;
            // Recorded before the call so an ambiguous failure mid-call
            // errs toward under-use of the provider's quota.
            self.quota.record_call(id);

            let error = match provider.fetch(request).await {
                Ok(payload) => {
                    debug!("Fetched {} for '{}' from '{}'", request.kind, request.symbol, id);
                    return Ok(payload);
                }
                Err(e) => e,
            };

            if error.retry_class() != RetryClass::WithBackoff || attempt >= self.config.max_attempts
            {
                return Err(error);
            }

            let wait = self.backoff_wait(&error, backoff);
            if slept + wait > self.config.max_total_backoff {
                warn!("Retry budget exhausted for '{}' on '{}'", request.symbol, id);
                return Err(error);
            }

            debug!(
                "Retrying '{}' on '{}' in {:?} (attempt {}/{})",
                request.symbol, id, wait, attempt, self.config.max_attempts
            );
            tokio::time::sleep(wait).await;
            slept += wait;
            backoff = backoff.saturating_mul(2);
            attempt += 1;
        }
    }

    /// Attempt a batch fetch against one provider, same gating and retry
    /// policy as [`try_provider`](Self::try_provider).
    async fn try_provider_batch(
        &self,
        provider: &dyn ProviderClient,
        symbols: &[String],
        kind: DataKind,
    ) -> Result<HashMap<String, FetchPayload>, FetchError> {
        let id = provider.id();
        let mut backoff = self.config.initial_backoff;
        let mut slept = Duration::ZERO;
        let mut attempt = 1;

        loop {
            self.acquire_quota(id).await?;
            self.quota.record_call(id);

            let error = match provider.fetch_batch(symbols, kind).await {
                Ok(map) => {
                    debug!(
                        "Fetched {} {} payloads from '{}' ({} requested)",
                        map.len(),
                        kind,
                        id,
                        symbols.len()
                    );
                    return Ok(map);
                }
                Err(e) => e,
            };

            if error.retry_class() != RetryClass::WithBackoff || attempt >= self.config.max_attempts
            {
                return Err(error);
            }

            let wait = self.backoff_wait(&error, backoff);
            if slept + wait > self.config.max_total_backoff {
                warn!("Retry budget exhausted for batch of {} on '{}'", symbols.len(), id);
                return Err(error);
            }

            tokio::time::sleep(wait).await;
            slept += wait;
            backoff = backoff.saturating_mul(2);
            attempt += 1;
        }
    }

    /// Gate one call on the quota tracker.
    ///
    /// A short wait (sub-window refill) is slept through; anything longer
    /// fails fast with `QuotaExhausted` so the caller falls through to the
    /// next candidate instead of blocking a worker.
    async fn acquire_quota(&self, provider: &str) -> Result<(), FetchError> {
        if self.quota.can_call(provider) {
            return Ok(());
        }

        let wait = self.quota.time_until_available(provider);
        if wait > self.config.max_quota_wait {
            debug!(
                "Provider '{}' unavailable for {:?}, skipping without consuming quota",
                provider, wait
            );
            return Err(FetchError::QuotaExhausted {
                provider: provider.to_string(),
            });
        }

        if wait > Duration::ZERO {
            debug!("Waiting {:?} for quota on '{}'", wait, provider);
            tokio::time::sleep(wait).await;
        }

        if self.quota.can_call(provider) {
            Ok(())
        } else {
            Err(FetchError::QuotaExhausted {
                provider: provider.to_string(),
            })
        }
    }

    /// Retry delay for a backoff-class error, honoring a server hint.
    fn backoff_wait(&self, error: &FetchError, backoff: Duration) -> Duration {
        match error {
            FetchError::RateLimited {
                retry_after: Some(hint),
                ..
            } => backoff.max(*hint),
            _ => backoff,
        }
    }

    /// Providers supporting `kind`, ordered by configured priority with
    /// id as the deterministic tiebreak.
    fn ordered_candidates(&self, kind: DataKind) -> Vec<&Arc<dyn ProviderClient>> {
        let mut candidates: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.capabilities().supports(kind))
            .collect();

        candidates.sort_by_key(|p| {
            (
                self.config
                    .priorities
                    .get(p.id())
                    .copied()
                    .unwrap_or(u8::MAX),
                p.id(),
            )
        });

        candidates
    }

    fn log_fallthrough(&self, provider: &str, error: &FetchError) {
        match error.retry_class() {
            RetryClass::WithBackoff => {
                warn!("Provider '{}' exhausted retries: {}", provider, error)
            }
            RetryClass::NextProvider => {
                info!("Provider '{}' failed, trying next: {}", provider, error)
            }
            RetryClass::Never => debug!("Provider '{}' cannot serve request: {}", provider, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceQuote;
    use crate::provider::{ProviderCapabilities, ProviderLimits};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum MockMode {
        Ok,
        RateLimited,
        SymbolNotFound,
        TimeoutThenOk(usize),
    }

    struct MockProvider {
        id: &'static str,
        batch_capable: bool,
        mode: MockMode,
        call_count: AtomicUsize,
        omit_symbols: Vec<&'static str>,
    }

    impl MockProvider {
        fn new(id: &'static str, mode: MockMode) -> Self {
            Self {
                id,
                batch_capable: false,
                mode,
                call_count: AtomicUsize::new(0),
                omit_symbols: Vec::new(),
            }
        }

        fn batching(id: &'static str, mode: MockMode) -> Self {
            Self {
                batch_capable: true,
                ..Self::new(id, mode)
            }
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn quote(symbol: &str) -> FetchPayload {
            FetchPayload::Quote(PriceQuote {
                symbol: symbol.to_string(),
                price: dec!(100),
                previous_close: None,
                volume: None,
                as_of: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            })
        }

        fn outcome(&self, symbol: &str) -> Result<FetchPayload, FetchError> {
            let n = self.call_count.fetch_add(1, Ordering::SeqCst);
            match &self.mode {
                MockMode::Ok => Ok(Self::quote(symbol)),
                MockMode::RateLimited => Err(FetchError::RateLimited {
                    provider: self.id.to_string(),
                    retry_after: None,
                }),
                MockMode::SymbolNotFound => Err(FetchError::SymbolNotFound(symbol.to_string())),
                MockMode::TimeoutThenOk(failures) => {
                    if n < *failures {
                        Err(FetchError::Timeout {
                            provider: self.id.to_string(),
                        })
                    } else {
                        Ok(Self::quote(symbol))
                    }
                }
            }
        }
    }

    #[async_trait]
    impl ProviderClient for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn capabilities(&self) -> ProviderCapabilities {
            if self.batch_capable {
                ProviderCapabilities {
                    kinds: &[DataKind::Quote],
                    batch_kinds: &[DataKind::Quote],
                    max_batch_size: 2,
                }
            } else {
                ProviderCapabilities {
                    kinds: &[DataKind::Quote],
                    batch_kinds: &[],
                    max_batch_size: 1,
                }
            }
        }

        fn limits(&self) -> ProviderLimits {
            ProviderLimits {
                daily_limit: 1000,
                per_minute_limit: 1000,
            }
        }

        async fn fetch(&self, request: &FetchRequest) -> Result<FetchPayload, FetchError> {
            self.outcome(&request.symbol)
        }

        async fn fetch_batch(
            &self,
            symbols: &[String],
            kind: DataKind,
        ) -> Result<HashMap<String, FetchPayload>, FetchError> {
            if !self.batch_capable {
                return Err(FetchError::UnsupportedKind {
                    provider: self.id.to_string(),
                    kind,
                });
            }
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(symbols
                .iter()
                .filter(|s| !self.omit_symbols.contains(&s.as_str()))
                .map(|s| (s.clone(), Self::quote(s)))
                .collect())
        }
    }

    fn fast_config(priorities: &[(&str, u8)]) -> RouterConfig {
        RouterConfig {
            priorities: priorities
                .iter()
                .map(|(id, rank)| (id.to_string(), *rank))
                .collect(),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_total_backoff: Duration::from_millis(100),
            max_quota_wait: Duration::from_millis(10),
        }
    }

    fn router_with(
        providers: Vec<Arc<dyn ProviderClient>>,
        config: RouterConfig,
    ) -> (ProviderRouter, Arc<QuotaTracker>) {
        let quota = Arc::new(QuotaTracker::new());
        let router = ProviderRouter::new(providers, Arc::clone(&quota), config);
        (router, quota)
    }

    #[tokio::test]
    async fn test_falls_back_to_lower_priority_on_rate_limit() {
        let primary = Arc::new(MockProvider::new("A", MockMode::RateLimited));
        let fallback = Arc::new(MockProvider::new("B", MockMode::Ok));
        let (router, quota) = router_with(
            vec![primary.clone(), fallback.clone()],
            fast_config(&[("A", 0), ("B", 1)]),
        );

        let request = FetchRequest::new("AAPL", DataKind::Quote);
        let payload = router.route(&request).await.unwrap();
        assert_eq!(payload.symbol(), "AAPL");

        // A was retried up to max_attempts and every attempt was recorded
        // against its quota; B answered on its first call.
        assert_eq!(primary.calls(), 3);
        assert_eq!(fallback.calls(), 1);
        let usage = quota.usage();
        let a = usage.iter().find(|u| u.provider == "A").unwrap();
        assert_eq!(a.calls_today, 3);
    }

    #[tokio::test]
    async fn test_exhausted_provider_skipped_without_consuming_quota() {
        let primary = Arc::new(MockProvider::new("A", MockMode::Ok));
        let fallback = Arc::new(MockProvider::new("B", MockMode::Ok));
        let (router, quota) = router_with(
            vec![primary.clone(), fallback.clone()],
            fast_config(&[("A", 0), ("B", 1)]),
        );
        // A has no quota left today.
        quota.configure(
            "A",
            ProviderLimits {
                daily_limit: 0,
                per_minute_limit: 10,
            },
        );

        let request = FetchRequest::new("AAPL", DataKind::Quote);
        router.route(&request).await.unwrap();

        assert_eq!(primary.calls(), 0);
        assert_eq!(fallback.calls(), 1);
        let usage = quota.usage();
        let a = usage.iter().find(|u| u.provider == "A").unwrap();
        assert_eq!(a.calls_today, 0);
    }

    #[tokio::test]
    async fn test_permanent_error_falls_through_without_retry() {
        let primary = Arc::new(MockProvider::new("A", MockMode::SymbolNotFound));
        let fallback = Arc::new(MockProvider::new("B", MockMode::Ok));
        let (router, _) = router_with(
            vec![primary.clone(), fallback.clone()],
            fast_config(&[("A", 0), ("B", 1)]),
        );

        let request = FetchRequest::new("AAPL", DataKind::Quote);
        router.route(&request).await.unwrap();

        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_error_retries_same_provider() {
        let primary = Arc::new(MockProvider::new("A", MockMode::TimeoutThenOk(1)));
        let fallback = Arc::new(MockProvider::new("B", MockMode::Ok));
        let (router, _) = router_with(
            vec![primary.clone(), fallback.clone()],
            fast_config(&[("A", 0), ("B", 1)]),
        );

        let request = FetchRequest::new("AAPL", DataKind::Quote);
        router.route(&request).await.unwrap();

        assert_eq!(primary.calls(), 2);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_failed_carries_last_error() {
        let a = Arc::new(MockProvider::new("A", MockMode::RateLimited));
        let b = Arc::new(MockProvider::new("B", MockMode::SymbolNotFound));
        let (router, _) = router_with(vec![a, b], fast_config(&[("A", 0), ("B", 1)]));

        let request = FetchRequest::new("BADSYM", DataKind::Quote);
        let err = router.route(&request).await.unwrap_err();
        match err {
            FetchError::AllProvidersFailed { kind, last } => {
                assert_eq!(kind, DataKind::Quote);
                assert!(last.contains("BADSYM"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_candidates_for_unsupported_kind() {
        let a = Arc::new(MockProvider::new("A", MockMode::Ok));
        let (router, _) = router_with(vec![a], fast_config(&[]));

        let request = FetchRequest::new("AAPL", DataKind::Earnings);
        let err = router.route(&request).await.unwrap_err();
        assert!(matches!(err, FetchError::NoProvidersAvailable { .. }));
    }

    #[tokio::test]
    async fn test_route_batch_chunks_to_provider_size() {
        let a = Arc::new(MockProvider::batching("A", MockMode::Ok));
        let (router, _) = router_with(vec![a.clone()], fast_config(&[("A", 0)]));

        let symbols: Vec<String> = ["AAPL", "MSFT", "GOOG"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let outcome = router.route_batch(&symbols, DataKind::Quote).await.unwrap();

        assert_eq!(outcome.payloads.len(), 3);
        assert!(outcome.failures.is_empty());
        // max_batch_size is 2, so three symbols cost two calls.
        assert_eq!(a.calls(), 2);
    }

    #[tokio::test]
    async fn test_route_batch_omitted_symbols_reach_fallback() {
        let mut primary = MockProvider::batching("A", MockMode::Ok);
        primary.omit_symbols = vec!["MISS"];
        let primary = Arc::new(primary);
        let fallback = Arc::new(MockProvider::new("B", MockMode::Ok));
        let (router, _) = router_with(
            vec![primary.clone(), fallback.clone()],
            fast_config(&[("A", 0), ("B", 1)]),
        );

        let symbols: Vec<String> = ["AAPL", "MISS"].iter().map(|s| s.to_string()).collect();
        let outcome = router.route_batch(&symbols, DataKind::Quote).await.unwrap();

        assert_eq!(outcome.payloads.len(), 2);
        assert!(outcome.failures.is_empty());
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_route_batch_reports_unserved_symbols() {
        let a = Arc::new(MockProvider::new("A", MockMode::SymbolNotFound));
        let (router, _) = router_with(vec![a], fast_config(&[("A", 0)]));

        let symbols: Vec<String> = vec!["BAD1".to_string(), "BAD2".to_string()];
        let outcome = router.route_batch(&symbols, DataKind::Quote).await.unwrap();

        assert!(outcome.payloads.is_empty());
        assert_eq!(outcome.failures.len(), 2);
    }

    #[test]
    fn test_priority_table_orders_candidates() {
        let a = Arc::new(MockProvider::new("ALPHA", MockMode::Ok));
        let b = Arc::new(MockProvider::new("BETA", MockMode::Ok));
        let c = Arc::new(MockProvider::new("GAMMA", MockMode::Ok));
        let (router, _) = router_with(
            vec![a, b, c],
            fast_config(&[("GAMMA", 0), ("ALPHA", 5)]),
        );

        let ordered = router.ordered_candidates(DataKind::Quote);
        assert_eq!(ordered[0].id(), "GAMMA");
        assert_eq!(ordered[1].id(), "ALPHA");
        // Unranked providers sort last.
        assert_eq!(ordered[2].id(), "BETA");
    }
}
