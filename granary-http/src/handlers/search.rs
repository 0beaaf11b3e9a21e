use axum::{
    extract::{RawQuery, State},
    http::Uri,
    Json,
};
use std::sync::Arc;
use std::time::Instant;

use granary::query::{QueryBudget, RawParams};
use granary::{GranaryError, SearchResponse};

use super::AppState;

/// Cancels the query when the handler future is dropped, which is what
/// happens when the client disconnects mid-request.
struct CancelOnDrop(QueryBudget);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Search activity records
#[utoipa::path(
    get,
    path = "/api/activities",
    tag = "search",
    params(
        ("q" = Option<String>, Query, description = "Free text; wrap in double quotes for a phrase"),
        ("type" = Option<String>, Query, description = "Exact record type, e.g. grant"),
        ("status" = Option<String>, Query, description = "Exact status, e.g. active"),
        ("purl" = Option<String>, Query, description = "Exact persistent URL"),
        ("identifier" = Option<String>, Query, description = "Contained in (or, quoted, equal to) an identifier"),
        ("title" = Option<String>, Query, description = "Title contains, or quoted phrase"),
        ("subject" = Option<String>, Query, description = "Subject contains, or quoted phrase"),
        ("description" = Option<String>, Query, description = "Description contains, or quoted phrase"),
        ("institution" = Option<String>, Query, description = "Institution contains, or quoted phrase"),
        ("funder" = Option<String>, Query, description = "Funder contains, or quoted phrase"),
        ("principalInvestigator" = Option<String>, Query, description = "Principal investigator contains, or quoted phrase"),
        ("researcher" = Option<String>, Query, description = "Researcher contains, or quoted phrase"),
        ("fundingScheme" = Option<String>, Query, description = "Funding scheme contains, or quoted phrase"),
        ("addedSince" = Option<String>, Query, description = "RFC 3339 timestamp or YYYY-MM-DD; dateTimeCreated lower bound"),
        ("modifiedSince" = Option<String>, Query, description = "RFC 3339 timestamp or YYYY-MM-DD; dateTimeModified lower bound"),
        ("offset" = Option<usize>, Query, description = "Records to skip (default 0)"),
        ("rows" = Option<usize>, Query, description = "Page size (default 10, capped)"),
        ("fl" = Option<String>, Query, description = "Comma-separated fields to echo; alias flags"),
        ("sort" = Option<String>, Query, description = "id, dateTimeCreated, dateTimeModified or title, with optional :asc or :desc")
    ),
    responses(
        (status = 200, description = "Matching records", body = SearchResponse),
        (status = 400, description = "Invalid parameter", body = serde_json::Value),
        (status = 503, description = "No corpus loaded", body = serde_json::Value),
        (status = 504, description = "Query timed out", body = serde_json::Value)
    )
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<SearchResponse>, GranaryError> {
    let start = Instant::now();
    let params = RawParams::from_query_string(query.as_deref().unwrap_or(""));
    let budget = QueryBudget::with_timeout(state.query_timeout);
    let guard = CancelOnDrop(budget.clone());

    let engine = state.engine.clone();
    let task = tokio::task::spawn_blocking(move || engine.search_with_budget(&params, budget));

    let response = match tokio::time::timeout(state.query_timeout, task).await {
        Ok(joined) => joined
            .map_err(|e| GranaryError::Internal(format!("search task failed: {}", e)))??,
        Err(_) => {
            guard.0.cancel();
            return Err(GranaryError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            });
        }
    };

    tracing::debug!(
        total = response.data.total_found,
        returned = response.data.records.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "search"
    );
    Ok(Json(response))
}

/// JSON 404 for every unrouted path.
pub async fn not_found(uri: Uri) -> GranaryError {
    GranaryError::NotFound(uri.path().to_string())
}
