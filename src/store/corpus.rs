use crate::error::{GranaryError, Result};
use crate::tokenizer::{normalize, normalize_all};
use crate::types::ActivityRecord;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A record plus the normalized text the relevance engine matches query
/// tokens against. Built once per corpus load.
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    pub record: ActivityRecord,
    pub(crate) title: String,
    pub(crate) identifier: String,
    pub(crate) subject: String,
    pub(crate) description: String,
    pub(crate) funder: String,
    pub(crate) people: String,
    pub(crate) other: String,
    /// Every string value, lowercased, one per line. Quoted `q` phrases are
    /// matched against this.
    pub(crate) text_view: String,
}

impl IndexedRecord {
    pub fn new(record: ActivityRecord) -> Self {
        let identifier = normalize_all(
            record
                .purl
                .as_deref()
                .into_iter()
                .chain(record.identifiers.iter().map(String::as_str)),
        );
        let people = normalize_all(
            record
                .principal_investigator
                .as_deref()
                .into_iter()
                .chain(record.researchers.iter().map(String::as_str)),
        );
        let other = normalize_all(
            record
                .institutions
                .iter()
                .map(String::as_str)
                .chain(record.funding_scheme.as_deref())
                .chain([
                    record.record_type.as_str(),
                    record.status.as_str(),
                    record.id.as_str(),
                ]),
        );
        let text_view = record.text_values().join("\n").to_lowercase();
        IndexedRecord {
            title: normalize_all(record.titles.iter().map(String::as_str)),
            identifier,
            subject: normalize_all(record.subjects.iter().map(String::as_str)),
            description: record.description.as_deref().map(normalize).unwrap_or_default(),
            funder: record.funder.as_deref().map(normalize).unwrap_or_default(),
            people,
            other,
            text_view,
            record,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn text_view(&self) -> &str {
        &self.text_view
    }
}

/// An immutable, validated set of records kept in ascending `id` order.
#[derive(Debug, Default)]
pub struct Corpus {
    records: Vec<IndexedRecord>,
    by_id: HashMap<String, usize>,
}

impl Corpus {
    /// Validate and index `records`. The corpus is accepted whole or not at
    /// all: the first invariant violation is returned as
    /// [`GranaryError::InvalidRecord`].
    pub fn from_records(records: Vec<ActivityRecord>) -> Result<Self> {
        let mut seen_ids = HashSet::with_capacity(records.len());
        let mut seen_purls = HashSet::new();
        for record in &records {
            validate(record)?;
            if !seen_ids.insert(record.id.as_str()) {
                return Err(GranaryError::invalid_record(&record.id, "duplicate id"));
            }
            if let Some(purl) = record.purl.as_deref() {
                if !seen_purls.insert(purl) {
                    return Err(GranaryError::invalid_record(
                        &record.id,
                        format!("purl {} is already used by another record", purl),
                    ));
                }
            }
        }

        let mut indexed: Vec<IndexedRecord> = records.into_iter().map(IndexedRecord::new).collect();
        indexed.sort_by(|a, b| a.id().cmp(b.id()));
        let by_id = indexed
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id().to_string(), i))
            .collect();
        Ok(Corpus {
            records: indexed,
            by_id,
        })
    }

    /// Read a corpus file: either one JSON array of records or one record
    /// per line (JSON lines). Blank lines are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GranaryError::Io(format!("{}: {}", path.display(), e)))?;
        let records = parse_records(&text)?;
        let corpus = Self::from_records(records)?;
        tracing::info!(
            path = %path.display(),
            records = corpus.len(),
            "loaded corpus"
        );
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in ascending `id` order.
    pub fn records(&self) -> &[IndexedRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&ActivityRecord> {
        self.by_id.get(id).map(|&i| &self.records[i].record)
    }
}

fn parse_records(text: &str) -> Result<Vec<ActivityRecord>> {
    if text.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(text)?);
    }
    let mut records = Vec::new();
    for (n, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line)
            .map_err(|e| GranaryError::Json(format!("line {}: {}", n + 1, e)))?;
        records.push(record);
    }
    Ok(records)
}

fn validate(record: &ActivityRecord) -> Result<()> {
    let fail = |reason: &str| Err(GranaryError::invalid_record(&record.id, reason));
    if record.id.is_empty() {
        return fail("id is empty");
    }
    if let Some(purl) = record.purl.as_deref() {
        if !record.identifiers.iter().any(|i| i == purl) {
            return fail("purl is not listed in identifiers");
        }
    }
    if record.date_time_modified < record.date_time_created {
        return fail("dateTimeModified is earlier than dateTimeCreated");
    }
    if record.titles.is_empty() {
        return fail("titles is empty");
    }
    if record.identifiers.is_empty() {
        return fail("identifiers is empty");
    }
    if record.institutions.is_empty() {
        return fail("institutions is empty");
    }
    if record.researchers.is_empty() {
        return fail("researchers is empty");
    }
    Ok(())
}
