// src/db/enforcers.rs
use crate::db::connection::Database;
use crate::db::documents::{self, DocQuery, Document, ENFORCERS};
use crate::domain::{Enforcer, Report, UNKNOWN_ENFORCER};
use crate::errors::ServerError;
use std::thread::ScopedJoinHandle;

/// Looks an enforcer up by document id, then by domain `uuid`.
pub fn get_enforcer_by_id(db: &Database, enforcer_id: &str) -> Result<Option<Enforcer>, ServerError> {
    if enforcer_id.is_empty() {
        return Ok(None);
    }

    if let Some(doc) = documents::get_doc(db, ENFORCERS, enforcer_id)? {
        return doc.decode().map(Some);
    }

    let by_uuid = DocQuery::collection(ENFORCERS)
        .where_eq("uuid", enforcer_id)
        .limit(1);
    documents::get_docs(db, &by_uuid)?
        .first()
        .map(Document::decode)
        .transpose()
}

/// Attaches `enforcerName` to every report that has an `enforcerId` but no
/// name yet. Lookups run concurrently; output order matches input order.
/// One failed lookup fails the whole pass.
pub fn enrich_reports_with_enforcer_data(
    db: &Database,
    reports: Vec<Report>,
) -> Result<Vec<Report>, ServerError> {
    if !reports.iter().any(Report::needs_enforcer_name) {
        return Ok(reports);
    }

    enum Slot<'scope> {
        Ready(Report),
        Lookup(ScopedJoinHandle<'scope, Result<Report, ServerError>>),
    }

    std::thread::scope(|scope| {
        let slots: Vec<Slot<'_>> = reports
            .into_iter()
            .map(|report| {
                if report.needs_enforcer_name() {
                    Slot::Lookup(scope.spawn(move || attach_enforcer_name(db, report)))
                } else {
                    Slot::Ready(report)
                }
            })
            .collect();

        slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Ready(report) => Ok(report),
                Slot::Lookup(handle) => handle.join().map_err(|_| ServerError::InternalError)?,
            })
            .collect()
    })
}

fn attach_enforcer_name(db: &Database, mut report: Report) -> Result<Report, ServerError> {
    let enforcer_id = report.enforcer_id.clone().unwrap_or_default();
    let enforcer = get_enforcer_by_id(db, &enforcer_id)?;

    let name = enforcer.as_ref().and_then(Enforcer::display_name);
    if name.is_none() {
        tracing::debug!(enforcer_id = %enforcer_id, "no enforcer name found");
    }
    report.enforcer_name = Some(name.unwrap_or_else(|| UNKNOWN_ENFORCER.to_string()));
    Ok(report)
}
