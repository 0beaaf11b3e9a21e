//! # Granary
//!
//! A query engine over a corpus of grant activity records: free-text
//! relevance search, per-field filters combined with AND, date lower bounds
//! and stable offset pagination.
//!
//! The engine only reads. A corpus is handed to it in memory or loaded from
//! a JSON file, validated once, and then queried through immutable
//! snapshots. The companion `granary-http` crate serves it over HTTP.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use granary::query::RawParams;
//! use granary::{PlannerLimits, RecordStore, SearchEngine};
//! use std::sync::Arc;
//!
//! # fn main() -> granary::Result<()> {
//! let store = Arc::new(RecordStore::open("./activities.json")?);
//! let engine = SearchEngine::new(store, PlannerLimits::default());
//!
//! let params = RawParams::from_query_string("q=fish&type=grant&rows=5");
//! let response = engine.search(&params)?;
//! println!("Found {} records", response.data.total_found);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Dependencies | Use case |
//! |---------|-------------|----------|
//! | `axum-support` | axum | [`GranaryError`] implements `IntoResponse` |
//! | `openapi` | utoipa | OpenAPI schema generation |
//!
//! Both are enabled by default.

pub mod engine;
pub mod error;
pub mod query;
pub mod store;
pub mod tokenizer;
pub mod types;

pub use engine::SearchEngine;
pub use error::{GranaryError, Result};
pub use query::{PlannerLimits, QueryBudget, QueryExecutor, QueryPlanner};
pub use store::{Corpus, RecordStore};
pub use types::*;
