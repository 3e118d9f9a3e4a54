// src/db/reports.rs
use crate::db::connection::Database;
use crate::db::documents::{self, Cursor, DocQuery, REPORTS};
use crate::db::enforcers::{enrich_reports_with_enforcer_data, get_enforcer_by_id};
use crate::db::pagination::{decode_each, fetch_with_count, in_store_order, newest_first};
use crate::domain::timestamp;
use crate::domain::{Enforcer, NewReport, Report};
use crate::errors::ServerError;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Reverse;

/// One page of the reports listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPage {
    pub reports: Vec<Report>,
    pub last_doc: Option<Cursor>,
    pub total_count: u64,
}

/// Reports listing with search.
///
/// A non-empty search tries an exact plate number first, then an exact
/// tracking number (upper-cased). Search results are sorted newest first in
/// memory. An empty search pages through everything newest first, resuming
/// after `last_doc`.
///
/// Store errors are logged and degrade to an empty page; enrichment errors
/// are returned.
pub fn get_reports(
    db: &Database,
    page_size: usize,
    last_doc: Option<&Cursor>,
    search_query: &str,
) -> Result<ReportPage, ServerError> {
    let page = match list_reports(db, page_size, last_doc, search_query) {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(error = %e, search = %search_query, "error getting report documents");
            ReportPage::default()
        }
    };

    let reports = enrich_reports_with_enforcer_data(db, page.reports)?;
    Ok(ReportPage { reports, ..page })
}

fn list_reports(
    db: &Database,
    page_size: usize,
    last_doc: Option<&Cursor>,
    search_query: &str,
) -> Result<ReportPage, ServerError> {
    if search_query.is_empty() {
        let page_q = DocQuery::collection(REPORTS)
            .order_by_created_desc()
            .limit(page_size)
            .start_after(last_doc.cloned());
        let (docs, total_count) = fetch_with_count(db, &page_q, &DocQuery::collection(REPORTS))?;
        let (reports, last_doc) = in_store_order::<Report>(&docs);
        return Ok(ReportPage {
            reports,
            last_doc,
            total_count,
        });
    }

    // The store cannot order on createdAt while filtering on another field,
    // so search pages are sorted here.
    let page_q = select_search_query(db, page_size, search_query)?;
    let (docs, total_count) = fetch_with_count(db, &page_q, &page_q.unbounded())?;
    let (reports, last_doc) = newest_first(&docs, Report::created_millis);
    Ok(ReportPage {
        reports,
        last_doc,
        total_count,
    })
}

/// Plate number wins over tracking number when both would match.
fn select_search_query(db: &Database, page_size: usize, search_query: &str) -> Result<DocQuery, ServerError> {
    let by_plate = DocQuery::collection(REPORTS)
        .where_eq("plateNumber", search_query)
        .limit(page_size);
    if !documents::get_docs(db, &by_plate)?.is_empty() {
        tracing::debug!(search = %search_query, "searching reports by plate number");
        return Ok(by_plate);
    }

    tracing::debug!(search = %search_query, "searching reports by tracking number");
    Ok(DocQuery::collection(REPORTS)
        .where_eq("trackingNumber", search_query.to_uppercase())
        .limit(page_size))
}

/// Exact tracking number lookup, matched verbatim. `None` when absent.
pub fn get_report_by_tracking_number(
    db: &Database,
    violation_tracking_number: &str,
) -> Result<Option<Report>, ServerError> {
    if violation_tracking_number.is_empty() {
        return Err(ServerError::Validation(
            "Violation tracking number is required.".into(),
        ));
    }

    let q = DocQuery::collection(REPORTS)
        .where_eq("trackingNumber", violation_tracking_number)
        .limit(1);

    let found = documents::get_docs(db, &q)
        .and_then(|docs| docs.first().map(|d| d.decode::<Report>()).transpose())
        .map_err(|e| {
            tracing::error!(error = %e, tracking_number = %violation_tracking_number, "error getting report by tracking number");
            e
        })?;

    let Some(report) = found else {
        return Ok(None);
    };
    let mut enriched = enrich_reports_with_enforcer_data(db, vec![report])?;
    Ok(enriched.pop())
}

/// Permanently removes a report. Related appeals are left alone.
pub fn delete_report(db: &Database, document_id: &str) -> Result<(), ServerError> {
    if document_id.is_empty() {
        return Err(ServerError::Validation(
            "Document ID is required to delete a report.".into(),
        ));
    }

    match documents::delete_doc(db, REPORTS, document_id) {
        Ok(()) => {
            tracing::info!(document_id = %document_id, "report deleted");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, document_id = %document_id, "error deleting report");
            Err(e)
        }
    }
}

/// Files a new report on behalf of an enforcer and returns its document id.
pub fn create_violation_report(
    db: &Database,
    new_report: &NewReport,
    enforcer_id: &str,
) -> Result<String, ServerError> {
    if enforcer_id.is_empty() {
        return Err(ServerError::Validation("Enforcer ID is required.".into()));
    }

    let enforcer = get_enforcer_by_id(db, enforcer_id)?;
    let now = Utc::now();
    let tracking_number = format!("TN{}", now.timestamp_millis());

    let Value::Object(mut data) = serde_json::to_value(new_report)? else {
        return Err(ServerError::InternalError);
    };
    // Service-assigned fields never come from the caller.
    data.remove("documentId");
    data.remove("enforcerName");
    data.insert("enforcerId".into(), Value::from(enforcer_id));
    if let Some(name) = enforcer.as_ref().and_then(Enforcer::display_name) {
        data.insert("enforcerName".into(), Value::from(name));
    }
    data.insert("trackingNumber".into(), Value::from(tracking_number.clone()));
    data.insert("createdAt".into(), timestamp::to_native(now));
    data.insert("status".into(), Value::from("Submitted"));
    data.insert("paymentStatus".into(), Value::from("Pending"));

    let document_id = documents::add_doc(db, REPORTS, data)?;
    tracing::info!(document_id = %document_id, tracking_number = %tracking_number, "report created");
    Ok(document_id)
}

/// Reports filed by an enforcer, newest first. Older reports link the
/// enforcer by document id or only through `createdById`, so those are
/// tried in turn when the `uuid` link finds nothing.
pub fn get_reports_by_enforcer(db: &Database, enforcer: &Enforcer) -> Result<Vec<Report>, ServerError> {
    let uuid = enforcer.uuid.as_deref().filter(|u| !u.is_empty());

    let mut attempts = Vec::new();
    if let Some(uuid) = uuid {
        attempts.push(("enforcerId", uuid));
    }
    if !enforcer.document_id.is_empty() {
        attempts.push(("enforcerId", enforcer.document_id.as_str()));
    }
    if let Some(uuid) = uuid {
        attempts.push(("createdById", uuid));
    }

    let mut docs = Vec::new();
    for (field, value) in attempts {
        docs = documents::get_docs(db, &DocQuery::collection(REPORTS).where_eq(field, value))?;
        if !docs.is_empty() {
            break;
        }
    }

    let mut reports: Vec<Report> = decode_each(&docs).into_iter().map(|(_, r)| r).collect();
    reports.sort_by_key(|r| Reverse(r.created_millis()));
    Ok(reports)
}

/// A driver's violation history, keyed by plate number.
pub fn get_reports_by_plate_number(db: &Database, plate_number: &str) -> Result<Vec<Report>, ServerError> {
    if plate_number.is_empty() {
        return Ok(Vec::new());
    }

    let q = DocQuery::collection(REPORTS).where_eq("plateNumber", plate_number);
    let docs = documents::get_docs(db, &q)?;
    Ok(decode_each(&docs).into_iter().map(|(_, r)| r).collect())
}
