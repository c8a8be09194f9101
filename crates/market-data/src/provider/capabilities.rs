//! Provider capabilities and declared rate-limit constants.
//!
//! This module defines structures describing what a data provider can do
//! and how much of it the vendor permits per day and per minute.

use serde::{Deserialize, Serialize};

use crate::models::DataKind;

/// Describes the capabilities of a data provider.
///
/// Used by the router to determine which providers can serve a request and
/// by the batch scheduler to size symbol groups.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Data kinds this provider serves.
    pub kinds: &'static [DataKind],

    /// Subset of `kinds` served by a genuine multi-symbol endpoint.
    /// Kinds outside this list cost one call per symbol.
    pub batch_kinds: &'static [DataKind],

    /// Maximum symbols per batch call. `1` means the provider has no batch
    /// endpoint and every symbol costs one call.
    pub max_batch_size: usize,
}

impl ProviderCapabilities {
    pub fn supports(&self, kind: DataKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn supports_batch_for(&self, kind: DataKind) -> bool {
        self.max_batch_size > 1 && self.batch_kinds.contains(&kind)
    }
}

/// Declared rate-limit constants for a provider.
///
/// These are the vendor-published caps the quota tracker enforces. They can
/// be overridden from configuration when an account tier differs from the
/// defaults a transport declares.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ProviderLimits {
    /// Maximum calls per UTC calendar day.
    pub daily_limit: u32,

    /// Maximum calls within any 60-second window.
    pub per_minute_limit: u32,
}

impl Default for ProviderLimits {
    fn default() -> Self {
        Self {
            daily_limit: 250,
            per_minute_limit: 60,
        }
    }
}
