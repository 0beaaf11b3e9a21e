use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Record identifier, opaque and unique across a corpus.
pub type RecordId = String;

/// One grant/activity entity.
///
/// Field names on the wire are camelCase (`dateTimeCreated`, `fundingScheme`,
/// ...). Unset optional fields serialize as `null` so every record in a
/// response has the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: RecordId,
    #[serde(default)]
    pub purl: Option<String>,
    #[serde(default)]
    pub identifiers: Vec<String>,
    #[serde(rename = "type")]
    pub record_type: String,
    pub status: String,
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub institutions: Vec<String>,
    #[serde(default)]
    pub funder: Option<String>,
    #[serde(default)]
    pub funding_scheme: Option<String>,
    #[serde(default)]
    pub principal_investigator: Option<String>,
    #[serde(default)]
    pub researchers: Vec<String>,
    pub date_time_created: DateTime<FixedOffset>,
    pub date_time_modified: DateTime<FixedOffset>,
}

impl ActivityRecord {
    /// Every string value of the record, in wire-field order.
    ///
    /// This is the textual rendering a quoted `q` phrase is matched against.
    pub fn text_values(&self) -> Vec<&str> {
        let mut values: Vec<&str> = vec![self.id.as_str()];
        values.extend(self.purl.as_deref());
        values.extend(self.identifiers.iter().map(String::as_str));
        values.push(self.record_type.as_str());
        values.push(self.status.as_str());
        values.extend(self.titles.iter().map(String::as_str));
        values.extend(self.description.as_deref());
        values.extend(self.subjects.iter().map(String::as_str));
        values.extend(self.institutions.iter().map(String::as_str));
        values.extend(self.funder.as_deref());
        values.extend(self.funding_scheme.as_deref());
        values.extend(self.principal_investigator.as_deref());
        values.extend(self.researchers.iter().map(String::as_str));
        values
    }

    /// Convert to a JSON object, keeping only the selected wire fields.
    ///
    /// `id` is always kept so paginated clients can track position.
    pub fn to_json(&self, selection: Option<&FieldSelection>) -> serde_json::Value {
        let value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        match (value, selection) {
            (serde_json::Value::Object(mut map), Some(selection)) => {
                map.retain(|key, _| {
                    key == RecordField::Id.as_str()
                        || RecordField::from_wire(key).is_some_and(|f| selection.contains(f))
                });
                serde_json::Value::Object(map)
            }
            (value, _) => value,
        }
    }
}

/// Wire names of the [`ActivityRecord`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordField {
    Id,
    Purl,
    Identifiers,
    Type,
    Status,
    Titles,
    Description,
    Subjects,
    Institutions,
    Funder,
    FundingScheme,
    PrincipalInvestigator,
    Researchers,
    DateTimeCreated,
    DateTimeModified,
}

impl RecordField {
    pub const ALL: [RecordField; 15] = [
        RecordField::Id,
        RecordField::Purl,
        RecordField::Identifiers,
        RecordField::Type,
        RecordField::Status,
        RecordField::Titles,
        RecordField::Description,
        RecordField::Subjects,
        RecordField::Institutions,
        RecordField::Funder,
        RecordField::FundingScheme,
        RecordField::PrincipalInvestigator,
        RecordField::Researchers,
        RecordField::DateTimeCreated,
        RecordField::DateTimeModified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordField::Id => "id",
            RecordField::Purl => "purl",
            RecordField::Identifiers => "identifiers",
            RecordField::Type => "type",
            RecordField::Status => "status",
            RecordField::Titles => "titles",
            RecordField::Description => "description",
            RecordField::Subjects => "subjects",
            RecordField::Institutions => "institutions",
            RecordField::Funder => "funder",
            RecordField::FundingScheme => "fundingScheme",
            RecordField::PrincipalInvestigator => "principalInvestigator",
            RecordField::Researchers => "researchers",
            RecordField::DateTimeCreated => "dateTimeCreated",
            RecordField::DateTimeModified => "dateTimeModified",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }
}

/// Fields echoed in `records`, from the `fl`/`flags` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldSelection {
    fields: Vec<RecordField>,
}

impl FieldSelection {
    pub fn new(fields: impl IntoIterator<Item = RecordField>) -> Self {
        let mut fields: Vec<RecordField> = fields.into_iter().collect();
        fields.sort();
        fields.dedup();
        FieldSelection { fields }
    }

    pub fn contains(&self, field: RecordField) -> bool {
        self.fields.binary_search(&field).is_ok()
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    DateTimeCreated,
    DateTimeModified,
    Title,
}

/// Explicit ordering requested with `sort=field[:asc|:desc]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

/// A matching record with its relevance. Both numbers are 0 without `q`.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: ActivityRecord,
    /// Distinct query tokens found anywhere in the record.
    pub coverage: u32,
    /// Field-weighted hit count.
    pub score: u32,
}

/// Results returned by [`QueryExecutor::execute`](crate::query::QueryExecutor::execute).
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The page window, in final order.
    pub records: Vec<ScoredRecord>,
    /// Number of matching records before pagination.
    pub total: usize,
    pub offset: usize,
    pub rows: usize,
    pub fields: Option<FieldSelection>,
}

impl SearchResult {
    /// Assemble the `{status, data: {totalFound, offset, records}}` envelope.
    pub fn into_response(self) -> SearchResponse {
        let selection = self.fields.as_ref();
        let records = self
            .records
            .iter()
            .map(|scored| scored.record.to_json(selection))
            .collect();
        SearchResponse {
            status: "OK".to_string(),
            data: SearchData {
                total_found: self.total,
                offset: self.offset,
                rows: self.rows,
                records,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchResponse {
    pub status: String,
    pub data: SearchData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub total_found: usize,
    pub offset: usize,
    pub rows: usize,
    pub records: Vec<serde_json::Value>,
}
