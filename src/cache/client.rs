// src/cache/client.rs
use crate::cache::query_cache::{QueryCache, QueryKey};
use crate::db::appeals::{self, AppealPage};
use crate::db::documents::Cursor;
use crate::db::reports::{self, ReportPage};
use crate::db::Database;
use crate::domain::{AppealResolution, Enforcer, NewReport, Report};
use crate::errors::ServerError;
use serde::Serialize;
use std::sync::Arc;

const REPORTS_KEY: &str = "reports";
const REPORT_KEY: &str = "report";
const APPEALS_KEY: &str = "appeals";
const ENFORCER_REPORTS_KEY: &str = "enforcer-reports";
const DRIVER_VIOLATIONS_KEY: &str = "driver-violations";

/// A page in a cursor-chained listing.
pub trait Paged {
    fn item_count(&self) -> usize;
    fn next_cursor(&self) -> Option<&Cursor>;
    fn total_count(&self) -> u64;
}

impl Paged for ReportPage {
    fn item_count(&self) -> usize {
        self.reports.len()
    }
    fn next_cursor(&self) -> Option<&Cursor> {
        self.last_doc.as_ref()
    }
    fn total_count(&self) -> u64 {
        self.total_count
    }
}

impl Paged for AppealPage {
    fn item_count(&self) -> usize {
        self.appeals.len()
    }
    fn next_cursor(&self) -> Option<&Cursor> {
        self.last_doc.as_ref()
    }
    fn total_count(&self) -> u64 {
        self.total_count
    }
}

/// All pages loaded so far for one listing key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfiniteData<P> {
    pub pages: Vec<P>,
    /// False for search listings: the search path answers one bounded page
    /// and ignores cursors, so there is never a next page to ask for.
    #[serde(skip)]
    pub resumable: bool,
}

impl<P: Paged> InfiniteData<P> {
    pub fn loaded_count(&self) -> usize {
        self.pages.iter().map(Paged::item_count).sum()
    }

    pub fn total_count(&self) -> u64 {
        self.pages.last().map(Paged::total_count).unwrap_or(0)
    }

    /// Cursor for the next fetch. `None` once the last page had no cursor or
    /// everything the listing counted is loaded.
    pub fn next_page_param(&self) -> Option<&Cursor> {
        if !self.resumable {
            return None;
        }
        let last = self.pages.last()?;
        let loaded = u64::try_from(self.loaded_count()).unwrap_or(u64::MAX);
        if loaded >= last.total_count() {
            return None;
        }
        last.next_cursor()
    }

    pub fn has_next_page(&self) -> bool {
        self.next_page_param().is_some()
    }
}

/// Read/mutation entry point for the dashboard. Reads go through the shared
/// [`QueryCache`]; mutations write through the services and then invalidate
/// the key families they may have made stale.
#[derive(Clone)]
pub struct QueryClient {
    db: Database,
    cache: Arc<QueryCache>,
    page_size: usize,
}

impl QueryClient {
    pub fn new(db: Database, cache: Arc<QueryCache>, page_size: usize) -> Self {
        Self {
            db,
            cache,
            page_size,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn fetch_query<T, F>(&self, key: QueryKey, fetch: F) -> Result<T, ServerError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&Database) -> Result<T, ServerError>,
    {
        if let Some(hit) = self.cache.get_fresh::<T>(&key) {
            tracing::debug!(key = %key, "cache hit");
            return Ok(hit);
        }

        let started_at = self.cache.generation();
        let value = fetch(&self.db).map_err(|e| {
            tracing::error!(key = %key, error = %e, "query failed");
            e
        })?;
        self.cache.populate(key, value.clone(), started_at);
        Ok(value)
    }

    /// First page, or the whole cached sequence when it is still fresh. A
    /// stale sequence starts over from the first page.
    fn fetch_infinite<P, F>(
        &self,
        key: QueryKey,
        resumable: bool,
        fetch_page: F,
    ) -> Result<InfiniteData<P>, ServerError>
    where
        P: Clone + Send + Sync + 'static,
        F: FnOnce(&Database, Option<&Cursor>) -> Result<P, ServerError>,
    {
        self.fetch_query(key, |db| {
            Ok(InfiniteData {
                pages: vec![fetch_page(db, None)?],
                resumable,
            })
        })
    }

    fn fetch_next_page<P, F>(
        &self,
        key: QueryKey,
        resumable: bool,
        fetch_page: F,
    ) -> Result<InfiniteData<P>, ServerError>
    where
        P: Paged + Clone + Send + Sync + 'static,
        F: Fn(&Database, Option<&Cursor>) -> Result<P, ServerError>,
    {
        // The extended sequence keeps the generation of its first page.
        let cached = self.cache.get_fresh_entry::<InfiniteData<P>>(&key);
        let Some((mut data, started_at)) = cached else {
            return self.fetch_infinite(key, resumable, fetch_page);
        };
        let Some(cursor) = data.next_page_param().cloned() else {
            return Ok(data);
        };

        let page = fetch_page(&self.db, Some(&cursor)).map_err(|e| {
            tracing::error!(key = %key, error = %e, "next page failed");
            e
        })?;
        data.pages.push(page);
        self.cache.populate(key, data.clone(), started_at);
        Ok(data)
    }

    // ----- Reads -----

    pub fn reports(&self, search_query: &str) -> Result<InfiniteData<ReportPage>, ServerError> {
        self.fetch_infinite(
            QueryKey::new([REPORTS_KEY, search_query]),
            search_query.is_empty(),
            |db, cursor| reports::get_reports(db, self.page_size, cursor, search_query),
        )
    }

    pub fn fetch_next_reports_page(&self, search_query: &str) -> Result<InfiniteData<ReportPage>, ServerError> {
        self.fetch_next_page(
            QueryKey::new([REPORTS_KEY, search_query]),
            search_query.is_empty(),
            |db, cursor| reports::get_reports(db, self.page_size, cursor, search_query),
        )
    }

    pub fn appeals(&self, search_query: &str) -> Result<InfiniteData<AppealPage>, ServerError> {
        self.fetch_infinite(
            QueryKey::new([APPEALS_KEY, search_query]),
            search_query.is_empty(),
            |db, cursor| Ok(appeals::get_appeals(db, self.page_size, cursor, search_query)),
        )
    }

    pub fn fetch_next_appeals_page(&self, search_query: &str) -> Result<InfiniteData<AppealPage>, ServerError> {
        self.fetch_next_page(
            QueryKey::new([APPEALS_KEY, search_query]),
            search_query.is_empty(),
            |db, cursor| Ok(appeals::get_appeals(db, self.page_size, cursor, search_query)),
        )
    }

    /// Disabled (no fetch, `None`) for an empty tracking number.
    pub fn report_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Report>, ServerError> {
        if tracking_number.is_empty() {
            return Ok(None);
        }
        self.fetch_query(
            QueryKey::new([REPORT_KEY, "trackingNumber", tracking_number]),
            |db| reports::get_report_by_tracking_number(db, tracking_number),
        )
    }

    /// Disabled for an enforcer without a `uuid`.
    pub fn enforcer_reports(&self, enforcer: &Enforcer) -> Result<Vec<Report>, ServerError> {
        let Some(uuid) = enforcer.uuid.as_deref().filter(|u| !u.is_empty()) else {
            return Ok(Vec::new());
        };
        self.fetch_query(
            QueryKey::new([ENFORCER_REPORTS_KEY, uuid, enforcer.document_id.as_str()]),
            |db| reports::get_reports_by_enforcer(db, enforcer),
        )
    }

    pub fn driver_violations(&self, plate_number: &str) -> Result<Vec<Report>, ServerError> {
        if plate_number.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_query(QueryKey::new([DRIVER_VIOLATIONS_KEY, plate_number]), |db| {
            reports::get_reports_by_plate_number(db, plate_number)
        })
    }

    // ----- Mutations -----

    pub fn update_appeal_status(&self, resolution: &AppealResolution) -> Result<(), ServerError> {
        appeals::update_appeal_status(&self.db, resolution)?;
        self.invalidate(&[APPEALS_KEY, REPORTS_KEY, REPORT_KEY]);
        Ok(())
    }

    pub fn delete_report(&self, document_id: &str) -> Result<(), ServerError> {
        reports::delete_report(&self.db, document_id)?;
        self.invalidate(&[
            REPORTS_KEY,
            REPORT_KEY,
            ENFORCER_REPORTS_KEY,
            DRIVER_VIOLATIONS_KEY,
        ]);
        Ok(())
    }

    pub fn create_report(&self, new_report: &NewReport, enforcer_id: &str) -> Result<String, ServerError> {
        let document_id = reports::create_violation_report(&self.db, new_report, enforcer_id)?;
        self.invalidate(&[REPORTS_KEY, ENFORCER_REPORTS_KEY, DRIVER_VIOLATIONS_KEY]);
        Ok(document_id)
    }

    fn invalidate(&self, families: &[&str]) {
        for family in families {
            self.cache.invalidate(&QueryKey::new([*family]));
        }
    }
}
