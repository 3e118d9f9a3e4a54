use crate::cache::{InfiniteData, QueryClient};
use crate::db::appeals::AppealPage;
use crate::db::enforcers::get_enforcer_by_id;
use crate::db::reports::ReportPage;
use crate::domain::{Appeal, AppealResolution, NewReport, Report, ReportSummary};
use crate::errors::{ResultResp, ServerError};
use crate::responses::{json_response, ok_json};
use astra::Request;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::io::Read;
use url::form_urlencoded;

pub fn handle(mut req: Request, client: &QueryClient) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let params = parse_query(&req);

    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode_segment)
        .collect();
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    tracing::debug!(method = %method, path = %path, "request");

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["health"]) => ok_json(&json!({ "status": "ok" })),

        // Reports
        ("GET", ["reports"]) => {
            let data = client.reports(search_param(&params))?;
            ok_json(&ReportsView::from(&data))
        }
        ("GET", ["reports", "next"]) => {
            let data = client.fetch_next_reports_page(search_param(&params))?;
            ok_json(&ReportsView::from(&data))
        }
        ("POST", ["reports"]) => {
            let body: CreateReportBody = parse_json(&read_body(&mut req)?)?;
            let document_id = client.create_report(&body.report, &body.enforcer_id)?;
            json_response(201, &json!({ "documentId": document_id }))
        }
        ("GET", ["reports", "tracking", tracking_number]) => {
            match client.report_by_tracking_number(tracking_number)? {
                Some(report) => ok_json(&report),
                None => Err(ServerError::NotFound),
            }
        }
        ("DELETE", ["reports", document_id]) => {
            client.delete_report(document_id)?;
            ok_json(&json!({ "deleted": document_id }))
        }

        // Appeals
        ("GET", ["appeals"]) => {
            let data = client.appeals(search_param(&params))?;
            ok_json(&AppealsView::from(&data))
        }
        ("GET", ["appeals", "next"]) => {
            let data = client.fetch_next_appeals_page(search_param(&params))?;
            ok_json(&AppealsView::from(&data))
        }
        ("POST", ["appeals", document_id, "status"]) => {
            let mut resolution: AppealResolution = parse_json(&read_body(&mut req)?)?;
            resolution.document_id = document_id.to_string();
            client.update_appeal_status(&resolution)?;
            ok_json(&json!({ "documentId": document_id, "status": resolution.status }))
        }

        // Related lists
        ("GET", ["enforcers", enforcer_id, "reports"]) => {
            let enforcer = get_enforcer_by_id(client.database(), enforcer_id)?
                .ok_or(ServerError::NotFound)?;
            let reports = client.enforcer_reports(&enforcer)?;
            ok_json(&RelatedReportsView::new(&reports))
        }
        ("GET", ["drivers", plate_number, "violations"]) => {
            let reports = client.driver_violations(plate_number)?;
            ok_json(&RelatedReportsView::new(&reports))
        }

        _ => Err(ServerError::NotFound),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReportBody {
    #[serde(default)]
    enforcer_id: String,
    #[serde(flatten)]
    report: NewReport,
}

/// Flattened view of a cached reports sequence.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportsView<'a> {
    reports: Vec<&'a Report>,
    total_count: u64,
    page_count: usize,
    has_next_page: bool,
}

impl<'a> From<&'a InfiniteData<ReportPage>> for ReportsView<'a> {
    fn from(data: &'a InfiniteData<ReportPage>) -> Self {
        Self {
            reports: data.pages.iter().flat_map(|p| p.reports.iter()).collect(),
            total_count: data.total_count(),
            page_count: data.pages.len(),
            has_next_page: data.has_next_page(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppealsView<'a> {
    appeals: Vec<&'a Appeal>,
    total_count: u64,
    page_count: usize,
    has_next_page: bool,
}

impl<'a> From<&'a InfiniteData<AppealPage>> for AppealsView<'a> {
    fn from(data: &'a InfiniteData<AppealPage>) -> Self {
        Self {
            appeals: data.pages.iter().flat_map(|p| p.appeals.iter()).collect(),
            total_count: data.total_count(),
            page_count: data.pages.len(),
            has_next_page: data.has_next_page(),
        }
    }
}

#[derive(Serialize)]
struct RelatedReportsView<'a> {
    reports: &'a [Report],
    summary: ReportSummary,
}

impl<'a> RelatedReportsView<'a> {
    fn new(reports: &'a [Report]) -> Self {
        Self {
            reports,
            summary: ReportSummary::from_reports(reports),
        }
    }
}

fn search_param(params: &HashMap<String, String>) -> &str {
    params.get("search").map(|s| s.trim()).unwrap_or("")
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

// Percent-decode one path segment. `+` is literal in paths.
fn decode_segment(raw: &str) -> String {
    let escaped = raw.replace('+', "%2B").replace('&', "%26");
    form_urlencoded::parse(format!("v={escaped}").as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

fn read_body(req: &mut Request) -> Result<String, ServerError> {
    let mut body = String::new();
    req.body_mut()
        .reader()
        .read_to_string(&mut body)
        .map_err(|e| ServerError::BadRequest(format!("unreadable body: {e}")))?;
    Ok(body)
}

fn parse_json<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ServerError> {
    serde_json::from_str(body).map_err(|e| ServerError::BadRequest(format!("invalid JSON body: {e}")))
}
