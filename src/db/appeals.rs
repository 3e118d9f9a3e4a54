// src/db/appeals.rs
use crate::db::connection::Database;
use crate::db::documents::{self, Cursor, DocQuery, APPEALS};
use crate::db::pagination::{fetch_with_count, in_store_order, newest_first};
use crate::domain::{Appeal, AppealResolution};
use crate::errors::ServerError;
use serde::Serialize;
use serde_json::{Map, Value};

/// One page of the appeals listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealPage {
    pub appeals: Vec<Appeal>,
    pub last_doc: Option<Cursor>,
    pub total_count: u64,
}

/// Appeals listing. A non-empty search matches the upper-cased tracking
/// number of the contested report. Store errors degrade to an empty page.
pub fn get_appeals(
    db: &Database,
    page_size: usize,
    last_doc: Option<&Cursor>,
    search_query: &str,
) -> AppealPage {
    list_appeals(db, page_size, last_doc, search_query).unwrap_or_else(|e| {
        tracing::error!(error = %e, search = %search_query, "error getting appeal documents");
        AppealPage::default()
    })
}

fn list_appeals(
    db: &Database,
    page_size: usize,
    last_doc: Option<&Cursor>,
    search_query: &str,
) -> Result<AppealPage, ServerError> {
    if search_query.is_empty() {
        let page_q = DocQuery::collection(APPEALS)
            .order_by_created_desc()
            .limit(page_size)
            .start_after(last_doc.cloned());
        let (docs, total_count) = fetch_with_count(db, &page_q, &DocQuery::collection(APPEALS))?;
        let (appeals, last_doc) = in_store_order::<Appeal>(&docs);
        return Ok(AppealPage {
            appeals,
            last_doc,
            total_count,
        });
    }

    let page_q = DocQuery::collection(APPEALS)
        .where_eq("violationTrackingNumber", search_query.to_uppercase())
        .limit(page_size);
    let (docs, total_count) = fetch_with_count(db, &page_q, &page_q.unbounded())?;
    let (appeals, last_doc) = newest_first(&docs, Appeal::created_millis);
    Ok(AppealPage {
        appeals,
        last_doc,
        total_count,
    })
}

/// Resolves an appeal. This is a field-level set of status, resolver,
/// tracking number and (when given) reason, so repeating a call with the
/// same arguments leaves the record unchanged. The contested report is not
/// touched.
pub fn update_appeal_status(db: &Database, resolution: &AppealResolution) -> Result<(), ServerError> {
    if resolution.document_id.is_empty() {
        return Err(ServerError::Validation("Appeal document ID is required.".into()));
    }
    if resolution.current_user_id.is_empty() {
        return Err(ServerError::Validation("Current user ID is required.".into()));
    }
    if !resolution.status.is_terminal() {
        return Err(ServerError::Validation(
            "Appeal status must be Approved or Rejected.".into(),
        ));
    }

    let mut fields = Map::new();
    fields.insert("status".into(), Value::from(resolution.status.as_str()));
    fields.insert("currentUserId".into(), Value::from(resolution.current_user_id.as_str()));
    fields.insert(
        "violationTrackingNumber".into(),
        Value::from(resolution.violation_tracking_number.as_str()),
    );
    if let Some(reason) = &resolution.reason {
        fields.insert("reason".into(), Value::from(reason.as_str()));
    }

    documents::update_doc(db, APPEALS, &resolution.document_id, fields).map_err(|e| {
        tracing::error!(error = %e, document_id = %resolution.document_id, "error updating appeal status");
        e
    })?;

    tracing::info!(
        document_id = %resolution.document_id,
        status = %resolution.status,
        resolver = %resolution.current_user_id,
        "appeal resolved"
    );
    Ok(())
}
