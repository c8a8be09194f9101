//! Per-provider call quota tracking.
//!
//! Tracks how many calls have been made to each provider within the
//! current UTC calendar day and the current 60-second window, and answers
//! "can I call this provider now" and "when can I call it next".
//!
//! Counters are in-memory and reset on process restart. That is safe in
//! the conservative direction because [`QuotaTracker::record_call`] is
//! invoked *before* the network call is issued: a crash mid-call leaves
//! the call counted, never uncounted.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use serde::Serialize;

use crate::provider::ProviderLimits;

/// Width of the sub-day rate window, in seconds.
const WINDOW_SECS: i64 = 60;

fn window() -> chrono::Duration {
    chrono::Duration::seconds(WINDOW_SECS)
}

/// Per-provider counters for the current day and window.
#[derive(Debug)]
struct QuotaWindow {
    /// UTC day the daily counter belongs to.
    day: NaiveDate,
    /// Calls recorded on `day`.
    calls_today: u32,
    /// Anchor of the current 60-second window.
    window_start: DateTime<Utc>,
    /// Calls recorded since `window_start`.
    calls_in_window: u32,
}

impl QuotaWindow {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            day: now.date_naive(),
            calls_today: 0,
            window_start: now,
            calls_in_window: 0,
        }
    }

    /// Roll the day and window forward if `now` has left them.
    ///
    /// The daily counter resets on date comparison, not a running timer,
    /// so a process that sleeps across midnight still resets exactly once.
    fn roll(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.day {
            self.day = today;
            self.calls_today = 0;
            self.window_start = now;
            self.calls_in_window = 0;
        } else if now - self.window_start >= window() {
            self.window_start = now;
            self.calls_in_window = 0;
        }
    }
}

/// Snapshot of one provider's quota state, for the status surface.
#[derive(Clone, Debug, Serialize)]
pub struct QuotaUsage {
    pub provider: String,
    pub day: NaiveDate,
    pub calls_today: u32,
    pub daily_limit: u32,
    pub calls_in_window: u32,
    pub per_minute_limit: u32,
}

/// Call quota tracker for multiple providers.
///
/// Thread-safe; the check-and-increment pair is the one critical section
/// shared by all workers, so callers hold it only for the counter update,
/// never across network I/O. Provider state is created lazily on first
/// use with the configured (or default) limits.
pub struct QuotaTracker {
    /// Per-provider counters.
    counters: Mutex<HashMap<String, QuotaWindow>>,
    /// Per-provider declared limits.
    limits: Mutex<HashMap<String, ProviderLimits>>,
}

impl QuotaTracker {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            limits: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the counters mutex, recovering from poison if necessary.
    ///
    /// Recovery is safe here: the worst case is a slightly stale counter,
    /// which is better than panicking every caller.
    fn lock_counters(&self) -> MutexGuard<'_, HashMap<String, QuotaWindow>> {
        self.counters.lock().unwrap_or_else(|poisoned| {
            warn!("Quota tracker counters mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Lock the limits mutex, recovering from poison if necessary.
    fn lock_limits(&self) -> MutexGuard<'_, HashMap<String, ProviderLimits>> {
        self.limits.lock().unwrap_or_else(|poisoned| {
            warn!("Quota tracker limits mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Set the limits for a provider, replacing any previous value.
    ///
    /// Counters already accumulated for the provider are kept; only the
    /// caps change.
    pub fn configure(&self, provider: &str, limits: ProviderLimits) {
        let mut all = self.lock_limits();
        all.insert(provider.to_string(), limits);
    }

    fn limits_for(&self, provider: &str) -> ProviderLimits {
        let all = self.lock_limits();
        all.get(provider).copied().unwrap_or_default()
    }

    /// Whether a call to `provider` is permitted right now.
    ///
    /// True iff the daily cap has headroom AND the current 60-second
    /// window has headroom. Pure check: counters are not consumed.
    pub fn can_call(&self, provider: &str) -> bool {
        self.can_call_at(provider, Utc::now())
    }

    fn can_call_at(&self, provider: &str, now: DateTime<Utc>) -> bool {
        let limits = self.limits_for(provider);
        let mut counters = self.lock_counters();
        let state = counters
            .entry(provider.to_string())
            .or_insert_with(|| QuotaWindow::new(now));
        state.roll(now);

        state.calls_today < limits.daily_limit && state.calls_in_window < limits.per_minute_limit
    }

    /// Record one call against `provider`.
    ///
    /// Must be invoked exactly once per actual network call, immediately
    /// before the call is issued, and never for a call skipped because
    /// [`can_call`](Self::can_call) returned false. The counter is
    /// advisory: recording does not itself enforce the cap.
    pub fn record_call(&self, provider: &str) {
        self.record_call_at(provider, Utc::now());
    }

    fn record_call_at(&self, provider: &str, now: DateTime<Utc>) {
        let mut counters = self.lock_counters();
        let state = counters
            .entry(provider.to_string())
            .or_insert_with(|| QuotaWindow::new(now));
        state.roll(now);
        state.calls_today += 1;
        state.calls_in_window += 1;
        debug!(
            "Quota: recorded call for '{}' ({} today, {} in window)",
            provider, state.calls_today, state.calls_in_window
        );
    }

    /// Minimum wait before [`can_call`](Self::can_call) would return true.
    ///
    /// Zero when callable now; time to the window reset when only the
    /// window is saturated; time to the next UTC midnight when the daily
    /// cap is exhausted.
    pub fn time_until_available(&self, provider: &str) -> Duration {
        self.time_until_available_at(provider, Utc::now())
    }

    fn time_until_available_at(&self, provider: &str, now: DateTime<Utc>) -> Duration {
        let limits = self.limits_for(provider);
        let mut counters = self.lock_counters();
        let state = counters
            .entry(provider.to_string())
            .or_insert_with(|| QuotaWindow::new(now));
        state.roll(now);

        if state.calls_today >= limits.daily_limit {
            let midnight = state
                .day
                .succ_opt()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc());
            return match midnight {
                Some(m) => (m - now).to_std().unwrap_or(Duration::ZERO),
                None => Duration::ZERO,
            };
        }

        if state.calls_in_window >= limits.per_minute_limit {
            let reset = state.window_start + window();
            return (reset - now).to_std().unwrap_or(Duration::ZERO);
        }

        Duration::ZERO
    }

    /// Snapshot of all tracked providers, for the status surface.
    pub fn usage(&self) -> Vec<QuotaUsage> {
        self.usage_at(Utc::now())
    }

    fn usage_at(&self, now: DateTime<Utc>) -> Vec<QuotaUsage> {
        let limits = self.lock_limits();
        let mut counters = self.lock_counters();

        let mut usage: Vec<QuotaUsage> = counters
            .iter_mut()
            .map(|(provider, state)| {
                state.roll(now);
                let caps = limits.get(provider).copied().unwrap_or_default();
                QuotaUsage {
                    provider: provider.clone(),
                    day: state.day,
                    calls_today: state.calls_today,
                    daily_limit: caps.daily_limit,
                    calls_in_window: state.calls_in_window,
                    per_minute_limit: caps.per_minute_limit,
                }
            })
            .collect();
        usage.sort_by(|a, b| a.provider.cmp(&b.provider));
        usage
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new()
    }
}
