//! Acquisition orchestration module.
//!
//! This module provides the machinery between a logical data need and a
//! concrete provider call:
//! - Per-provider call quota tracking (daily and per-minute windows)
//! - Deterministic batch planning against provider batch sizes
//! - Priority-ordered routing with retry, backoff and fallback

mod batch;
mod quota;
mod router;

pub use batch::{BatchPlan, FetchBatch};
pub use quota::{QuotaTracker, QuotaUsage};
pub use router::{BatchOutcome, ProviderRouter, RouterConfig};
