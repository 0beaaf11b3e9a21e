use crate::error::{GranaryError, Result};
use crate::query::filter::matches_all;
use crate::query::matcher::phrase_in_view;
use crate::query::planner::{FreeText, QueryPlan};
use crate::store::Corpus;
use crate::types::{ScoredRecord, SearchResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod relevance;
pub mod sorting;

pub use relevance::{FieldHits, RelevanceKey};

/// Records scanned between budget checks.
const BUDGET_CHECK_INTERVAL: usize = 256;

/// Deadline and cancellation for one query.
///
/// Cloning shares the cancel flag, so the caller can keep a copy and call
/// [`QueryBudget::cancel`] while the query runs on another thread.
#[derive(Debug, Clone)]
pub struct QueryBudget {
    started: Instant,
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Default for QueryBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl QueryBudget {
    pub fn unlimited() -> Self {
        QueryBudget {
            started: Instant::now(),
            deadline: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let started = Instant::now();
        QueryBudget {
            started,
            deadline: started.checked_add(timeout),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(GranaryError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            let now = Instant::now();
            if now >= deadline {
                return Err(GranaryError::Timeout {
                    elapsed_ms: now.duration_since(self.started).as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

/// A record that survived matching, by position in the corpus.
struct Candidate {
    index: usize,
    key: RelevanceKey,
}

#[derive(Debug, Clone, Default)]
pub struct QueryExecutor {
    budget: QueryBudget,
}

impl QueryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(mut self, budget: QueryBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Run `plan` against `corpus`: match, order, then cut the page window.
    ///
    /// Either the whole result is produced or an error is returned; a query
    /// stopped by its budget never yields a partial page.
    pub fn execute(&self, corpus: &Corpus, plan: &QueryPlan) -> Result<SearchResult> {
        let t0 = Instant::now();
        let mut candidates = self.collect_matches(corpus, plan)?;
        let t_match = t0.elapsed();

        self.budget.check()?;
        let records = corpus.records();
        if let Some(sort) = &plan.sort {
            candidates.sort_unstable_by(|a, b| {
                sorting::compare_by_sort(&records[a.index], &records[b.index], sort)
            });
        } else if plan.text.is_some() {
            candidates.sort_unstable_by(|a, b| {
                relevance::compare_ranked(
                    (&a.key, records[a.index].id()),
                    (&b.key, records[b.index].id()),
                )
            });
        }
        // Otherwise candidates are already in corpus (ascending id) order.
        let t_rank = t0.elapsed();

        self.budget.check()?;
        let total = candidates.len();
        let page: Vec<ScoredRecord> = candidates
            .iter()
            .skip(plan.page.offset)
            .take(plan.page.rows)
            .map(|c| ScoredRecord {
                record: records[c.index].record.clone(),
                coverage: c.key.coverage,
                score: c.key.weighted,
            })
            .collect();

        tracing::debug!(
            "[SEARCH] match={:?} rank={:?} assemble={:?} filters={} total={} returned={}",
            t_match,
            t_rank.saturating_sub(t_match),
            t0.elapsed().saturating_sub(t_rank),
            plan.filters.len(),
            total,
            page.len()
        );

        Ok(SearchResult {
            records: page,
            total,
            offset: plan.page.offset,
            rows: plan.page.rows,
            fields: plan.fields.clone(),
        })
    }

    fn collect_matches(&self, corpus: &Corpus, plan: &QueryPlan) -> Result<Vec<Candidate>> {
        let mut out = Vec::new();
        for (index, indexed) in corpus.records().iter().enumerate() {
            if index % BUDGET_CHECK_INTERVAL == 0 {
                self.budget.check()?;
            }
            if !matches_all(&plan.filters, &indexed.record) {
                continue;
            }
            let key = match &plan.text {
                None => RelevanceKey::default(),
                Some(FreeText::Terms { tokens, .. }) => {
                    let (hits, coverage) = relevance::field_hits(indexed, tokens);
                    if coverage == 0 {
                        continue;
                    }
                    relevance::relevance_key(&hits, coverage)
                }
                Some(FreeText::Phrase { phrase, tokens }) => {
                    if !phrase_in_view(indexed.text_view(), phrase) {
                        continue;
                    }
                    let (hits, coverage) = relevance::field_hits(indexed, tokens);
                    relevance::relevance_key(&hits, coverage)
                }
            };
            out.push(Candidate { index, key });
        }
        Ok(out)
    }
}
