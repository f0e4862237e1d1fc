use libris_index::CatalogRecord;
use libris_types::{BookId, PatronId};

/// Plain view of a catalog record handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BookReport {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub available: bool,
    pub borrowed_by: Option<PatronId>,
    /// Waiting patrons in service order.
    pub reservations: Vec<PatronId>,
}

impl From<&CatalogRecord> for BookReport {
    fn from(record: &CatalogRecord) -> Self {
        Self {
            id: record.id(),
            title: record.title().to_owned(),
            author: record.author().to_owned(),
            available: record.is_available(),
            borrowed_by: record.held_by(),
            reservations: record
                .waitlist()
                .ordered()
                .into_iter()
                .map(|entry| entry.patron)
                .collect(),
        }
    }
}
