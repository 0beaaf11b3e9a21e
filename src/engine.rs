use crate::error::Result;
use crate::query::{PlannerLimits, QueryBudget, QueryExecutor, QueryPlanner, RawParams};
use crate::store::RecordStore;
use crate::types::SearchResponse;
use std::sync::Arc;

/// Planner plus record store: the whole request path from raw parameters to
/// a response envelope.
///
/// Create one per process and share it; [`SearchEngine::search`] takes
/// `&self` and each call pins its own corpus snapshot.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    store: Arc<RecordStore>,
    planner: QueryPlanner,
}

impl SearchEngine {
    pub fn new(store: Arc<RecordStore>, limits: PlannerLimits) -> Self {
        SearchEngine {
            store,
            planner: QueryPlanner::new(limits),
        }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn search(&self, params: &RawParams) -> Result<SearchResponse> {
        self.search_with_budget(params, QueryBudget::unlimited())
    }

    /// Parameters are validated before the snapshot is taken, so a bad
    /// request is reported as such even when no corpus is loaded.
    pub fn search_with_budget(
        &self,
        params: &RawParams,
        budget: QueryBudget,
    ) -> Result<SearchResponse> {
        let plan = self.planner.plan(params)?;
        let snapshot = self.store.snapshot()?;
        let result = QueryExecutor::new()
            .with_budget(budget)
            .execute(&snapshot.corpus, &plan)?;
        Ok(result.into_response())
    }
}
