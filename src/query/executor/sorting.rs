use crate::store::IndexedRecord;
use crate::types::{Sort, SortField, SortOrder};
use std::cmp::Ordering;

/// Compare two records by an explicit sort. Ties, and records with no title
/// under a title sort, fall back to ascending `id` so the order stays total.
pub fn compare_by_sort(a: &IndexedRecord, b: &IndexedRecord, sort: &Sort) -> Ordering {
    let primary = match sort.field {
        SortField::Id => a.id().cmp(b.id()),
        SortField::DateTimeCreated => a
            .record
            .date_time_created
            .cmp(&b.record.date_time_created),
        SortField::DateTimeModified => a
            .record
            .date_time_modified
            .cmp(&b.record.date_time_modified),
        SortField::Title => title_key(a).cmp(&title_key(b)),
    };
    let primary = match sort.order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id().cmp(b.id()))
}

fn title_key(r: &IndexedRecord) -> Option<String> {
    r.record.titles.first().map(|t| t.to_lowercase())
}
