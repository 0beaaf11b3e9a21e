//! Token-overlap relevance.
//!
//! Scoring is a pure function of [`FieldHits`], so ordering can be checked
//! without building a corpus.

use crate::store::IndexedRecord;
use std::cmp::Ordering;

pub const TITLE_WEIGHT: u32 = 8;
pub const IDENTIFIER_WEIGHT: u32 = 6;
pub const SUBJECT_WEIGHT: u32 = 4;
pub const DESCRIPTION_WEIGHT: u32 = 2;
pub const FUNDER_WEIGHT: u32 = 2;
pub const PEOPLE_WEIGHT: u32 = 1;
pub const OTHER_WEIGHT: u32 = 1;

/// Number of distinct query tokens found in each field group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldHits {
    pub title: u32,
    pub identifier: u32,
    pub subject: u32,
    pub description: u32,
    pub funder: u32,
    /// Principal investigator and researchers.
    pub people: u32,
    /// Institutions, funding scheme, type, status and id.
    pub other: u32,
}

impl FieldHits {
    pub fn weighted(&self) -> u32 {
        self.title * TITLE_WEIGHT
            + self.identifier * IDENTIFIER_WEIGHT
            + self.subject * SUBJECT_WEIGHT
            + self.description * DESCRIPTION_WEIGHT
            + self.funder * FUNDER_WEIGHT
            + self.people * PEOPLE_WEIGHT
            + self.other * OTHER_WEIGHT
    }
}

/// Sort key for free-text results. Higher ranks first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelevanceKey {
    pub coverage: u32,
    pub weighted: u32,
}

/// Count hits of `tokens` in each field group of `record`, and how many
/// tokens hit at least one group.
pub fn field_hits(record: &IndexedRecord, tokens: &[String]) -> (FieldHits, u32) {
    let mut hits = FieldHits::default();
    let mut coverage = 0;
    for token in tokens {
        let token = token.as_str();
        let mut any = false;
        for (text, count) in [
            (&record.title, &mut hits.title),
            (&record.identifier, &mut hits.identifier),
            (&record.subject, &mut hits.subject),
            (&record.description, &mut hits.description),
            (&record.funder, &mut hits.funder),
            (&record.people, &mut hits.people),
            (&record.other, &mut hits.other),
        ] {
            if text.contains(token) {
                *count += 1;
                any = true;
            }
        }
        if any {
            coverage += 1;
        }
    }
    (hits, coverage)
}

pub fn relevance_key(hits: &FieldHits, coverage: u32) -> RelevanceKey {
    RelevanceKey {
        coverage,
        weighted: hits.weighted(),
    }
}

/// Total order: key descending, then id ascending.
pub fn compare_ranked(a: (&RelevanceKey, &str), b: (&RelevanceKey, &str)) -> Ordering {
    b.0.cmp(a.0).then_with(|| a.1.cmp(b.1))
}
