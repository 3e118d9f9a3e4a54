use super::{body_json, send, test_client};
use crate::db::documents::{self, REPORTS};
use crate::tests::utils::{init_test_db, native, report_body, seed_doc, seed_enforcer, seed_report};
use http::Method;
use serde_json::json;

#[test]
fn health_check() {
    let t = init_test_db();
    let resp = send(&test_client(&t.db), Method::GET, "/health", None);
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp), json!({ "status": "ok" }));
}

#[test]
fn reports_listing_and_next_page() {
    let t = init_test_db();
    for i in 0..12 {
        seed_report(&t.db, &format!("r{i:02}"), "P", &format!("TN{i}"), 100 + i);
    }
    let client = test_client(&t.db);

    let resp = send(&client, Method::GET, "/reports", None);
    assert_eq!(resp.status(), 200);
    let first = body_json(resp);
    assert_eq!(first["totalCount"], 12);
    assert_eq!(first["reports"].as_array().unwrap().len(), 10);
    assert_eq!(first["reports"][0]["documentId"], "r11");
    assert_eq!(first["hasNextPage"], true);

    let next = body_json(send(&client, Method::GET, "/reports/next", None));
    assert_eq!(next["reports"].as_array().unwrap().len(), 12);
    assert_eq!(next["pageCount"], 2);
    assert_eq!(next["hasNextPage"], false);
}

#[test]
fn reports_search_param_is_trimmed() {
    let t = init_test_db();
    seed_report(&t.db, "r1", "ABC123", "TN1", 100);
    seed_report(&t.db, "r2", "XYZ999", "TN2", 200);

    let body = body_json(send(&test_client(&t.db), Method::GET, "/reports?search=+ABC123+", None));
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["reports"][0]["plateNumber"], "ABC123");
}

#[test]
fn tracking_number_lookup() {
    let t = init_test_db();
    seed_report(&t.db, "r1", "ABC123", "TN42", 100);
    let client = test_client(&t.db);

    let resp = send(&client, Method::GET, "/reports/tracking/TN42", None);
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["documentId"], "r1");

    let resp = send(&client, Method::GET, "/reports/tracking/TN404", None);
    assert_eq!(resp.status(), 404);
}

#[test]
fn delete_report_route() {
    let t = init_test_db();
    seed_report(&t.db, "r1", "ABC123", "TN1", 100);

    let resp = send(&test_client(&t.db), Method::DELETE, "/reports/r1", None);
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp), json!({ "deleted": "r1" }));
    assert!(documents::get_doc(&t.db, REPORTS, "r1").unwrap().is_none());
}

#[test]
fn create_report_route() {
    let t = init_test_db();
    seed_enforcer(&t.db, "e1", Some("uuid-e1"), "Maria", "Santos");
    let client = test_client(&t.db);

    let payload = json!({
        "enforcerId": "e1",
        "fullname": "Pedro Penduko",
        "plateNumber": "NEW001",
        "violations": [{ "violationName": "No Helmet", "fine": 500 }]
    });
    let resp = send(&client, Method::POST, "/reports", Some(&payload.to_string()));
    assert_eq!(resp.status(), 201);
    let id = body_json(resp)["documentId"].as_str().unwrap().to_string();

    let stored: crate::domain::Report = documents::get_doc(&t.db, REPORTS, &id)
        .unwrap()
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(stored.plate_number, "NEW001");
    assert_eq!(stored.enforcer_name.as_deref(), Some("Maria Santos"));
}

#[test]
fn create_report_without_enforcer_is_rejected() {
    let t = init_test_db();
    let resp = send(
        &test_client(&t.db),
        Method::POST,
        "/reports",
        Some(r#"{"plateNumber":"NEW001"}"#),
    );
    assert_eq!(resp.status(), 400);
    assert_eq!(body_json(resp)["error"], "Enforcer ID is required.");
}

#[test]
fn enforcer_and_driver_report_lists() {
    let t = init_test_db();
    seed_enforcer(&t.db, "e1", Some("uuid-e1"), "Maria", "Santos");
    let mut body = report_body("ABC 123", "TN1", native(100));
    body["enforcerId"] = json!("uuid-e1");
    body["status"] = json!("Paid");
    seed_doc(&t.db, REPORTS, "r1", body);
    let client = test_client(&t.db);

    let resp = send(&client, Method::GET, "/enforcers/e1/reports", None);
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    assert_eq!(body["reports"].as_array().unwrap().len(), 1);
    assert_eq!(body["summary"]["paidReports"], 1);
    assert_eq!(body["summary"]["totalViolations"], 1);

    // The plate contains a space; the path segment is percent-decoded.
    let body = body_json(send(&client, Method::GET, "/drivers/ABC%20123/violations", None));
    assert_eq!(body["summary"]["totalReports"], 1);

    let resp = send(&client, Method::GET, "/enforcers/nobody/reports", None);
    assert_eq!(resp.status(), 404);
}

#[test]
fn unknown_route_is_not_found() {
    let t = init_test_db();
    let resp = send(&test_client(&t.db), Method::GET, "/nowhere", None);
    assert_eq!(resp.status(), 404);
    assert_eq!(body_json(resp), json!({ "error": "Not Found" }));
}
