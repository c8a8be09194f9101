//! Batch planning for multi-symbol provider calls.
//!
//! Groups pending ticker symbols into provider-sized batches so a
//! 500-symbol universe costs 5 calls against a provider with a
//! 100-symbol endpoint instead of 500. Planning is deterministic and
//! order-preserving, and a plan can be resumed from any batch index
//! after a mid-run failure.

use serde::Serialize;

use crate::models::DataKind;

/// One group of symbols destined for a single provider call.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FetchBatch {
    /// Position of this batch within its plan, for resumption.
    pub index: usize,
    /// The data kind every symbol in the group needs.
    pub kind: DataKind,
    /// Symbols in input order, deduplicated.
    pub symbols: Vec<String>,
}

/// A deterministic partition of a symbol list into provider-sized groups.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchPlan {
    kind: DataKind,
    batches: Vec<FetchBatch>,
}

impl BatchPlan {
    /// Partition `symbols` into groups of at most `max_batch_size`.
    ///
    /// Duplicate symbols are dropped (first occurrence wins) and input
    /// order is preserved, so the same `(symbols, kind, max_batch_size)`
    /// triple always yields the identical plan.
    pub fn plan(symbols: &[String], kind: DataKind, max_batch_size: usize) -> Self {
        let size = max_batch_size.max(1);

        let mut seen = std::collections::HashSet::new();
        let deduped: Vec<String> = symbols
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect();

        let batches = deduped
            .chunks(size)
            .enumerate()
            .map(|(index, chunk)| FetchBatch {
                index,
                kind,
                symbols: chunk.to_vec(),
            })
            .collect();

        Self { kind, batches }
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn batches(&self) -> &[FetchBatch] {
        &self.batches
    }

    /// Batches from `index` onward, for resuming after a failure.
    pub fn resume_from(&self, index: usize) -> &[FetchBatch] {
        if index >= self.batches.len() {
            &[]
        } else {
            &self.batches[index..]
        }
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Total symbols across all batches.
    pub fn symbol_count(&self) -> usize {
        self.batches.iter().map(|b| b.symbols.len()).sum()
    }
}
