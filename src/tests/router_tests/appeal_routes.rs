use super::{body_json, send, test_client};
use crate::tests::utils::{init_test_db, seed_appeal};
use http::Method;
use serde_json::json;

#[test]
fn appeals_listing() {
    let t = init_test_db();
    seed_appeal(&t.db, "a1", "TN1", 100);
    seed_appeal(&t.db, "a2", "TN2", 200);

    let body = body_json(send(&test_client(&t.db), Method::GET, "/appeals", None));
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["appeals"][0]["documentId"], "a2");
    assert_eq!(body["hasNextPage"], false);
}

#[test]
fn resolve_appeal_route() {
    let t = init_test_db();
    seed_appeal(&t.db, "a1", "TN123", 100);
    let client = test_client(&t.db);

    // Warm the listing so the route's invalidation is observable.
    let before = body_json(send(&client, Method::GET, "/appeals", None));
    assert_eq!(before["appeals"][0]["status"], "Pending");

    let payload = json!({
        "status": "Rejected",
        "currentUserId": "u1",
        "violationTrackingNumber": "TN123",
        "reason": "Insufficient evidence"
    });
    let resp = send(&client, Method::POST, "/appeals/a1/status", Some(&payload.to_string()));
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp), json!({ "documentId": "a1", "status": "Rejected" }));

    let after = body_json(send(&client, Method::GET, "/appeals", None));
    assert_eq!(after["appeals"][0]["status"], "Rejected");
    assert_eq!(after["appeals"][0]["reason"], "Insufficient evidence");
}

#[test]
fn resolve_appeal_rejects_bad_input() {
    let t = init_test_db();
    seed_appeal(&t.db, "a1", "TN123", 100);
    let client = test_client(&t.db);

    let resp = send(&client, Method::POST, "/appeals/a1/status", Some("{not json"));
    assert_eq!(resp.status(), 400);

    let pending = json!({ "status": "Pending", "currentUserId": "u1" }).to_string();
    let resp = send(&client, Method::POST, "/appeals/a1/status", Some(&pending));
    assert_eq!(resp.status(), 400);

    let approve = json!({ "status": "Approved", "currentUserId": "u1" }).to_string();
    let resp = send(&client, Method::POST, "/appeals/missing/status", Some(&approve));
    assert_eq!(resp.status(), 404);
}
