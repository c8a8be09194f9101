//! Marketscore Core Crate
//!
//! Score computation, run orchestration, and versioned score persistence
//! for the marketscore pipeline. The acquisition layer lives in the
//! `marketscore-market-data` crate; the CLI/scheduler entry points and
//! the raw-data tables are external collaborators.
//!
//! # Data flow
//!
//! ```text
//! ticker universe
//!       │
//!       ▼
//! ScoringService::refresh_market_data ──► BatchPlan ──► ProviderRouter
//!       │                                                    │
//!       │                               RawDataSink ◄── FetchPayload
//!       ▼
//! ScoreOrchestrator::run ──► technical/fundamental/analyst computers
//!       │
//!       ▼
//! ScoreStore::upsert (current row + history row, one transaction)
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod scoring;
pub mod service;
pub mod store;

pub use errors::{DatabaseError, Error, Result};
pub use scoring::{
    AnalystInputs, CalculationStatus, EarningsCalendar, FundamentalInputs, OrchestratorConfig,
    RawInputStore, RunState, RunSummary, ScoreOrchestrator, ScoreRecord, TechnicalInputs,
    TickerOutcome,
};
pub use service::{IngestSummary, PipelineStatus, RawDataSink, ScoringService};
pub use store::{DomainStatusCounts, ScoreStore, SqliteScoreStore, StatusCounts};
