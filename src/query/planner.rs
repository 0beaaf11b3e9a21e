//! Turns raw request parameters into a [`QueryPlan`].
//!
//! Value syntax:
//! - `value`      bare, matched as a case-insensitive substring
//! - `"value"`    quoted, matched as a whole value (or phrase, for `q`)
//! - `\"` inside quotes is a literal quote
//!
//! The quoted form is parsed with nom combinators.

use crate::error::{GranaryError, Result};
use crate::query::filter::{FieldFilter, MatchValue};
use crate::query::params::RawParams;
use crate::query::stopwords::remove_stop_words;
use crate::tokenizer::tokenize;
use crate::types::{FieldSelection, RecordField, Sort, SortField, SortOrder};
use chrono::{DateTime, FixedOffset, NaiveDate};
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::char,
    combinator::{all_consuming, map, value},
    sequence::delimited,
    IResult,
};

pub const DEFAULT_ROWS: usize = 10;
pub const MAX_ROWS: usize = 100;

/// Every parameter name the planner understands.
pub const KNOWN_PARAMS: &[&str] = &[
    "q",
    "type",
    "status",
    "purl",
    "identifier",
    "title",
    "subject",
    "description",
    "institution",
    "funder",
    "principalInvestigator",
    "researcher",
    "fundingScheme",
    "addedSince",
    "modifiedSince",
    "offset",
    "rows",
    "fl",
    "flags",
    "sort",
];

/// Free-text clause from `q`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreeText {
    /// Bare `q`: normalized, de-duplicated tokens with stop words removed.
    Terms { raw: String, tokens: Vec<String> },
    /// Quoted `q`: the phrase plus its tokens (used only for ranking).
    Phrase { phrase: String, tokens: Vec<String> },
}

impl FreeText {
    pub fn tokens(&self) -> &[String] {
        match self {
            FreeText::Terms { tokens, .. } | FreeText::Phrase { tokens, .. } => tokens,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub offset: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub text: Option<FreeText>,
    pub filters: Vec<FieldFilter>,
    pub page: PageSpec,
    pub fields: Option<FieldSelection>,
    pub sort: Option<Sort>,
}

impl QueryPlan {
    /// A plan with no constraints: every record, default order.
    pub fn match_all(page: PageSpec) -> Self {
        QueryPlan {
            text: None,
            filters: Vec::new(),
            page,
            fields: None,
            sort: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerLimits {
    pub default_rows: usize,
    pub max_rows: usize,
}

impl Default for PlannerLimits {
    fn default() -> Self {
        PlannerLimits {
            default_rows: DEFAULT_ROWS,
            max_rows: MAX_ROWS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryPlanner {
    limits: PlannerLimits,
}

impl QueryPlanner {
    pub fn new(limits: PlannerLimits) -> Self {
        QueryPlanner { limits }
    }

    pub fn limits(&self) -> PlannerLimits {
        self.limits
    }

    pub fn plan(&self, params: &RawParams) -> Result<QueryPlan> {
        for name in params.names() {
            if !KNOWN_PARAMS.contains(&name) {
                tracing::debug!(param = name, "ignoring unknown parameter");
            }
        }

        let text = match params.single("q")? {
            Some(q) => plan_free_text(q),
            None => None,
        };

        let mut filters = Vec::new();
        for raw in params.get_all("type") {
            filters.push(FieldFilter::Type(unquote(raw)));
        }
        for raw in params.get_all("status") {
            filters.push(FieldFilter::Status(unquote(raw)));
        }
        for raw in params.get_all("purl") {
            filters.push(FieldFilter::Purl(unquote(raw)));
        }
        let text_filters: [(&str, fn(MatchValue) -> FieldFilter); 9] = [
            ("identifier", FieldFilter::Identifier),
            ("title", FieldFilter::Title),
            ("subject", FieldFilter::Subject),
            ("description", FieldFilter::Description),
            ("institution", FieldFilter::Institution),
            ("funder", FieldFilter::Funder),
            ("principalInvestigator", FieldFilter::PrincipalInvestigator),
            ("researcher", FieldFilter::Researcher),
            ("fundingScheme", FieldFilter::FundingScheme),
        ];
        for (name, build) in text_filters {
            for raw in params.get_all(name) {
                filters.push(build(parse_match_value(raw)));
            }
        }
        for raw in params.get_all("addedSince") {
            if !raw.trim().is_empty() {
                filters.push(FieldFilter::AddedSince(parse_timestamp("addedSince", raw)?));
            }
        }
        for raw in params.get_all("modifiedSince") {
            if !raw.trim().is_empty() {
                filters.push(FieldFilter::ModifiedSince(parse_timestamp(
                    "modifiedSince",
                    raw,
                )?));
            }
        }
        filters.retain(|f| !f.is_unconstrained());
        tracing::debug!(
            text_tokens = text.as_ref().map_or(0, |t| t.tokens().len()),
            filters = ?filters.iter().map(FieldFilter::param_name).collect::<Vec<_>>(),
            "planned query"
        );

        let offset = match params.single("offset")? {
            Some(v) => parse_count("offset", v)?,
            None => 0,
        };
        let rows = match params.single("rows")? {
            Some(v) => parse_count("rows", v)?.min(self.limits.max_rows),
            None => self.limits.default_rows,
        };

        let fields = parse_field_selection(params);

        let sort = match params.single("sort")? {
            Some(v) if !v.trim().is_empty() => Some(parse_sort(v)?),
            _ => None,
        };

        Ok(QueryPlan {
            text,
            filters,
            page: PageSpec { offset, rows },
            fields,
            sort,
        })
    }
}

fn plan_free_text(q: &str) -> Option<FreeText> {
    match parse_match_value(q) {
        MatchValue::Phrase(phrase) => {
            if phrase.is_empty() {
                return None;
            }
            let tokens = dedup(tokenize(&phrase));
            Some(FreeText::Phrase { phrase, tokens })
        }
        MatchValue::Contains(raw) => {
            let tokens = remove_stop_words(dedup(tokenize(&raw)));
            if tokens.is_empty() {
                return None;
            }
            Some(FreeText::Terms { raw, tokens })
        }
    }
}

fn dedup(tokens: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokens
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn quoted(input: &str) -> IResult<&str, String> {
    alt((
        map(tag("\"\""), |_| String::new()),
        delimited(
            char('"'),
            escaped_transform(
                is_not("\\\""),
                '\\',
                alt((value("\"", tag("\"")), value("\\", tag("\\")))),
            ),
            char('"'),
        ),
    ))(input)
}

/// Classify a filter value as bare (contains) or quoted (phrase).
pub fn parse_match_value(raw: &str) -> MatchValue {
    let trimmed = raw.trim();
    match all_consuming(quoted)(trimmed) {
        Ok((_, phrase)) => MatchValue::Phrase(phrase),
        Err(_) => MatchValue::Contains(trimmed.to_string()),
    }
}

/// Exact-match fields accept quotes but compare the inner text byte-exactly.
fn unquote(raw: &str) -> String {
    match parse_match_value(raw) {
        MatchValue::Phrase(s) => s,
        MatchValue::Contains(s) => s,
    }
}

/// RFC 3339, or a plain `YYYY-MM-DD` date meaning midnight UTC.
///
/// A `+` in a numeric offset arrives as a space when the client did not
/// percent-encode it, so `2015-11-28T13:15:30 10:00` is read as `+10:00`.
pub fn parse_timestamp(name: &str, raw: &str) -> Result<DateTime<FixedOffset>> {
    let v = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(v) {
        return Ok(t);
    }
    if let Some(idx) = v.rfind(' ') {
        let repaired = format!("{}+{}", &v[..idx], &v[idx + 1..]);
        if let Ok(t) = DateTime::parse_from_rfc3339(&repaired) {
            return Ok(t);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(v, "%Y-%m-%d") {
        if let Some(midnight) = d.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc().fixed_offset());
        }
    }
    Err(GranaryError::invalid_parameter(
        name,
        format!("'{}' is not an RFC 3339 timestamp or YYYY-MM-DD date", raw),
    ))
}

/// A non-negative decimal integer, optionally with a leading `+`. Values too
/// large for `usize` saturate; the page window is empty either way.
fn parse_count(name: &str, raw: &str) -> Result<usize> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GranaryError::invalid_parameter(
            name,
            format!("'{}' is not a non-negative integer", raw),
        ));
    }
    Ok(digits.parse::<usize>().unwrap_or(usize::MAX))
}

/// Union of every `fl` and `flags` value, comma separated. Unknown names are
/// ignored; `None` when nothing was requested.
fn parse_field_selection(params: &RawParams) -> Option<FieldSelection> {
    let raw_values: Vec<&String> = params
        .get_all("fl")
        .iter()
        .chain(params.get_all("flags"))
        .collect();
    if raw_values.is_empty() {
        return None;
    }
    let mut fields = Vec::new();
    for name in raw_values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        match RecordField::from_wire(name) {
            Some(f) => fields.push(f),
            None => tracing::debug!(field = name, "ignoring unknown field in selection"),
        }
    }
    if fields.is_empty() {
        return None;
    }
    Some(FieldSelection::new(fields))
}

fn parse_sort(raw: &str) -> Result<Sort> {
    let (field_name, order_name) = match raw.trim().split_once(':') {
        Some((f, o)) => (f.trim(), o.trim()),
        None => (raw.trim(), "asc"),
    };
    let field = match field_name {
        "id" => SortField::Id,
        "dateTimeCreated" => SortField::DateTimeCreated,
        "dateTimeModified" => SortField::DateTimeModified,
        "title" | "titles" => SortField::Title,
        other => {
            return Err(GranaryError::invalid_parameter(
                "sort",
                format!("cannot sort by '{}'", other),
            ))
        }
    };
    let order = match order_name.to_ascii_lowercase().as_str() {
        "asc" => SortOrder::Asc,
        "desc" => SortOrder::Desc,
        other => {
            return Err(GranaryError::invalid_parameter(
                "sort",
                format!("unknown direction '{}', expected asc or desc", other),
            ))
        }
    };
    Ok(Sort { field, order })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(query: &str) -> Result<QueryPlan> {
        QueryPlanner::default().plan(&RawParams::from_query_string(query))
    }

    #[test]
    fn empty_params_plan_everything() {
        let p = plan("").unwrap();
        assert_eq!(p, QueryPlan::match_all(PageSpec { offset: 0, rows: DEFAULT_ROWS }));
    }

    #[test]
    fn bare_and_quoted_values() {
        assert_eq!(
            parse_match_value("unique biology"),
            MatchValue::Contains("unique biology".into())
        );
        assert_eq!(
            parse_match_value("\"unique biology\""),
            MatchValue::Phrase("unique biology".into())
        );
        assert_eq!(
            parse_match_value(r#""say \"hi\"""#),
            MatchValue::Phrase("say \"hi\"".into())
        );
        assert_eq!(parse_match_value("\"\""), MatchValue::Phrase(String::new()));
        assert_eq!(
            parse_match_value("\"unbalanced"),
            MatchValue::Contains("\"unbalanced".into())
        );
    }

    #[test]
    fn empty_filter_values_are_dropped() {
        let p = plan("funder=%22Australian+Research+Council%22&type=grant&title=&status=%22%22")
            .unwrap();
        assert_eq!(
            p.filters,
            vec![
                FieldFilter::Type("grant".into()),
                FieldFilter::Funder(MatchValue::Phrase("Australian Research Council".into())),
            ]
        );
    }

    #[test]
    fn repeated_filter_values_are_all_kept() {
        let p = plan("title=cave&title=climate").unwrap();
        assert_eq!(p.filters.len(), 2);
    }

    #[test]
    fn exact_fields_strip_quotes() {
        let p = plan("purl=%22http%3A%2F%2Fpurl.org%2Fx%22").unwrap();
        assert_eq!(p.filters, vec![FieldFilter::Purl("http://purl.org/x".into())]);
    }

    #[test]
    fn free_text_terms_drop_stop_words_and_duplicates() {
        let p = plan("q=the+Fish+of+fish").unwrap();
        assert_eq!(
            p.text,
            Some(FreeText::Terms {
                raw: "the Fish of fish".into(),
                tokens: vec!["fish".into()]
            })
        );
    }

    #[test]
    fn free_text_phrase() {
        let p = plan("q=%22chorizo+risotto%22").unwrap();
        assert_eq!(
            p.text,
            Some(FreeText::Phrase {
                phrase: "chorizo risotto".into(),
                tokens: vec!["chorizo".into(), "risotto".into()]
            })
        );
    }

    #[test]
    fn punctuation_only_q_is_unconstrained() {
        assert_eq!(plan("q=%21%21").unwrap().text, None);
        assert_eq!(plan("q=").unwrap().text, None);
    }

    #[test]
    fn dates_accept_rfc3339_plain_dates_and_unencoded_plus() {
        let p = plan("addedSince=2015-11-28T13:15:30Z&modifiedSince=2015-11-28").unwrap();
        assert_eq!(
            p.filters,
            vec![
                FieldFilter::AddedSince(
                    DateTime::parse_from_rfc3339("2015-11-28T13:15:30Z").unwrap()
                ),
                FieldFilter::ModifiedSince(
                    DateTime::parse_from_rfc3339("2015-11-28T00:00:00Z").unwrap()
                ),
            ]
        );
        let p = plan("addedSince=2015-11-28T13:15:30+10:00").unwrap();
        assert_eq!(
            p.filters,
            vec![FieldFilter::AddedSince(
                DateTime::parse_from_rfc3339("2015-11-28T13:15:30+10:00").unwrap()
            )]
        );
    }

    #[test]
    fn bad_dates_are_invalid_parameters() {
        for q in ["addedSince=yesterday", "modifiedSince=2015-13-45", "addedSince=28/11/2015"] {
            let err = plan(q).unwrap_err();
            assert!(
                matches!(err, GranaryError::InvalidParameter { .. }),
                "{} -> {:?}",
                q,
                err
            );
        }
    }

    #[test]
    fn pagination_defaults_and_cap() {
        let p = plan("offset=5").unwrap();
        assert_eq!(p.page, PageSpec { offset: 5, rows: DEFAULT_ROWS });
        let p = plan("rows=100000").unwrap();
        assert_eq!(p.page.rows, MAX_ROWS);
        let p = plan("rows=0").unwrap();
        assert_eq!(p.page.rows, 0);
        let p = plan("offset=%2B7").unwrap();
        assert_eq!(p.page.offset, 7);
    }

    #[test]
    fn oversized_counts_saturate() {
        let p = plan("offset=18446744073709551616").unwrap();
        assert_eq!(p.page.offset, usize::MAX);
        let p = plan("rows=99999999999999999999999").unwrap();
        assert_eq!(p.page.rows, MAX_ROWS);
    }

    #[test]
    fn bad_pagination_is_rejected() {
        for q in [
            "offset=-1",
            "rows=-5",
            "offset=abc",
            "rows=1.5",
            "offset=1&offset=2",
            "offset=%2B",
            "rows=",
            "offset=1e3",
        ] {
            let err = plan(q).unwrap_err();
            assert!(matches!(err, GranaryError::InvalidParameter { .. }), "{}", q);
        }
    }

    #[test]
    fn custom_limits() {
        let planner = QueryPlanner::new(PlannerLimits {
            default_rows: 3,
            max_rows: 4,
        });
        let p = planner.plan(&RawParams::new()).unwrap();
        assert_eq!(p.page.rows, 3);
        let p = planner.plan(&RawParams::new().with("rows", "9")).unwrap();
        assert_eq!(p.page.rows, 4);
    }

    #[test]
    fn field_selection_unions_fl_and_flags() {
        let p = plan("fl=titles,purl&flags=titles&flags=bogus").unwrap();
        let fields = p.fields.unwrap();
        assert_eq!(fields.fields(), &[RecordField::Purl, RecordField::Titles]);
        assert_eq!(plan("flags=bogus").unwrap().fields, None);
    }

    #[test]
    fn sort_parsing() {
        assert_eq!(
            plan("sort=dateTimeCreated:desc").unwrap().sort,
            Some(Sort {
                field: SortField::DateTimeCreated,
                order: SortOrder::Desc
            })
        );
        assert_eq!(
            plan("sort=title").unwrap().sort,
            Some(Sort {
                field: SortField::Title,
                order: SortOrder::Asc
            })
        );
        assert!(plan("sort=funder").is_err());
        assert!(plan("sort=id:sideways").is_err());
    }

    #[test]
    fn unknown_params_are_ignored() {
        let p = plan("foo=bar&numFound=3").unwrap();
        assert!(p.filters.is_empty());
    }
}
