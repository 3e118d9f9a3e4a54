// src/db/pagination.rs
use crate::db::connection::Database;
use crate::db::documents::{self, Cursor, DocQuery, Document};
use crate::errors::ServerError;
use serde::de::DeserializeOwned;
use std::cmp::Reverse;

/// Runs the bounded page query and the unbounded count side by side.
pub fn fetch_with_count(
    db: &Database,
    page: &DocQuery,
    count: &DocQuery,
) -> Result<(Vec<Document>, u64), ServerError> {
    std::thread::scope(|scope| {
        let counter = scope.spawn(|| documents::count(db, count));
        let docs = documents::get_docs(db, page);
        let total = counter.join().map_err(|_| ServerError::InternalError)?;
        Ok((docs?, total?))
    })
}

/// Decodes a listing. A document that does not decode is logged and left out;
/// the rest of the page survives.
pub fn decode_each<T: DeserializeOwned>(docs: &[Document]) -> Vec<(&Document, T)> {
    docs.iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(item) => Some((doc, item)),
            Err(e) => {
                tracing::warn!(document_id = %doc.id, error = %e, "skipping undecodable document");
                None
            }
        })
        .collect()
}

/// Decodes documents in the order the store returned them. The cursor points
/// at the store's last document, skipped or not.
pub fn in_store_order<T: DeserializeOwned>(docs: &[Document]) -> (Vec<T>, Option<Cursor>) {
    let items = decode_each::<T>(docs).into_iter().map(|(_, item)| item).collect();
    (items, docs.last().map(Document::cursor))
}

/// Decodes and sorts newest first in memory (stable; unparseable dates last).
/// The cursor points at the document behind the last *sorted* item, which is
/// not necessarily the store's last document.
pub fn newest_first<T, F>(docs: &[Document], created_millis: F) -> (Vec<T>, Option<Cursor>)
where
    T: DeserializeOwned,
    F: Fn(&T) -> i64,
{
    let mut decoded = decode_each::<T>(docs);
    decoded.sort_by_key(|(_, item)| Reverse(created_millis(item)));

    let cursor = decoded.last().map(|(doc, _)| doc.cursor());
    let items = decoded.into_iter().map(|(_, item)| item).collect();
    (items, cursor)
}
