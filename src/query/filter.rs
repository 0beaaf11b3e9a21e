use crate::query::matcher::{
    contains_any, contains_opt, exact_match, exact_opt, phrase_any, phrase_opt,
};
use crate::types::ActivityRecord;
use chrono::{DateTime, FixedOffset};

/// How a filter value is compared against a text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchValue {
    /// Bare value: case-insensitive substring.
    Contains(String),
    /// Double-quoted value: case-insensitive equality with a whole value.
    Phrase(String),
}

impl MatchValue {
    pub fn text(&self) -> &str {
        match self {
            MatchValue::Contains(s) | MatchValue::Phrase(s) => s,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    fn matches_opt(&self, field: Option<&str>) -> bool {
        match self {
            MatchValue::Contains(v) => contains_opt(field, v),
            MatchValue::Phrase(v) => phrase_opt(field, v),
        }
    }

    fn matches_any(&self, elements: &[String]) -> bool {
        match self {
            MatchValue::Contains(v) => contains_any(elements, v),
            MatchValue::Phrase(v) => phrase_any(elements, v),
        }
    }
}

/// One structured constraint. Variants are fixed: each names its target
/// field and its comparison, so dispatch never goes through field-name
/// strings at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    Type(String),
    Status(String),
    Purl(String),
    Identifier(MatchValue),
    Title(MatchValue),
    Subject(MatchValue),
    Description(MatchValue),
    Institution(MatchValue),
    Funder(MatchValue),
    PrincipalInvestigator(MatchValue),
    Researcher(MatchValue),
    FundingScheme(MatchValue),
    AddedSince(DateTime<FixedOffset>),
    ModifiedSince(DateTime<FixedOffset>),
}

impl FieldFilter {
    /// Request parameter that produces this filter.
    pub fn param_name(&self) -> &'static str {
        match self {
            FieldFilter::Type(_) => "type",
            FieldFilter::Status(_) => "status",
            FieldFilter::Purl(_) => "purl",
            FieldFilter::Identifier(_) => "identifier",
            FieldFilter::Title(_) => "title",
            FieldFilter::Subject(_) => "subject",
            FieldFilter::Description(_) => "description",
            FieldFilter::Institution(_) => "institution",
            FieldFilter::Funder(_) => "funder",
            FieldFilter::PrincipalInvestigator(_) => "principalInvestigator",
            FieldFilter::Researcher(_) => "researcher",
            FieldFilter::FundingScheme(_) => "fundingScheme",
            FieldFilter::AddedSince(_) => "addedSince",
            FieldFilter::ModifiedSince(_) => "modifiedSince",
        }
    }

    /// A filter whose value is empty constrains nothing and is dropped by
    /// the planner.
    pub fn is_unconstrained(&self) -> bool {
        match self {
            FieldFilter::Type(v) | FieldFilter::Status(v) | FieldFilter::Purl(v) => v.is_empty(),
            FieldFilter::Identifier(v)
            | FieldFilter::Title(v)
            | FieldFilter::Subject(v)
            | FieldFilter::Description(v)
            | FieldFilter::Institution(v)
            | FieldFilter::Funder(v)
            | FieldFilter::PrincipalInvestigator(v)
            | FieldFilter::Researcher(v)
            | FieldFilter::FundingScheme(v) => v.is_empty(),
            FieldFilter::AddedSince(_) | FieldFilter::ModifiedSince(_) => false,
        }
    }

    pub fn matches(&self, record: &ActivityRecord) -> bool {
        match self {
            FieldFilter::Type(v) => exact_match(&record.record_type, v),
            FieldFilter::Status(v) => exact_match(&record.status, v),
            FieldFilter::Purl(v) => exact_opt(record.purl.as_deref(), v),
            FieldFilter::Identifier(v) => v.matches_any(&record.identifiers),
            FieldFilter::Title(v) => v.matches_any(&record.titles),
            FieldFilter::Subject(v) => v.matches_any(&record.subjects),
            FieldFilter::Description(v) => v.matches_opt(record.description.as_deref()),
            FieldFilter::Institution(v) => v.matches_any(&record.institutions),
            FieldFilter::Funder(v) => v.matches_opt(record.funder.as_deref()),
            FieldFilter::PrincipalInvestigator(v) => {
                v.matches_opt(record.principal_investigator.as_deref())
            }
            FieldFilter::Researcher(v) => v.matches_any(&record.researchers),
            FieldFilter::FundingScheme(v) => v.matches_opt(record.funding_scheme.as_deref()),
            FieldFilter::AddedSince(t) => record.date_time_created >= *t,
            FieldFilter::ModifiedSince(t) => record.date_time_modified >= *t,
        }
    }
}

/// True when the record satisfies every filter (logical AND).
pub fn matches_all(filters: &[FieldFilter], record: &ActivityRecord) -> bool {
    filters.iter().all(|f| f.matches(record))
}
