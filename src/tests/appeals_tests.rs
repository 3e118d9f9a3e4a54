use crate::db::appeals::{get_appeals, update_appeal_status, AppealPage};
use crate::db::documents::{self, APPEALS, REPORTS};
use crate::domain::{Appeal, AppealResolution, AppealStatus};
use crate::errors::ServerError;
use crate::tests::utils::{broken_db, init_test_db, native, seed_appeal, seed_doc, seed_report};
use serde_json::{json, Value};

fn resolution(status: AppealStatus, reason: Option<&str>) -> AppealResolution {
    AppealResolution {
        document_id: "a1".into(),
        status,
        current_user_id: "u1".into(),
        violation_tracking_number: "TN123".into(),
        reason: reason.map(String::from),
    }
}

fn stored_appeal(db: &crate::db::Database, id: &str) -> Appeal {
    documents::get_doc(db, APPEALS, id)
        .unwrap()
        .expect("appeal should exist")
        .decode()
        .unwrap()
}

#[test]
fn rejecting_stores_status_reason_and_resolver() {
    let t = init_test_db();
    seed_appeal(&t.db, "a1", "TN123", 100);

    update_appeal_status(&t.db, &resolution(AppealStatus::Rejected, Some("Insufficient evidence"))).unwrap();

    let appeal = stored_appeal(&t.db, "a1");
    assert_eq!(appeal.status, AppealStatus::Rejected);
    assert_eq!(appeal.reason.as_deref(), Some("Insufficient evidence"));
    assert_eq!(appeal.current_user_id.as_deref(), Some("u1"));
    assert_eq!(appeal.violation_tracking_number, "TN123");
    // Appellant details survive the update.
    assert_eq!(appeal.extra.get("appellantName"), Some(&Value::from("Juan Dela Cruz")));
}

#[test]
fn repeating_a_resolution_is_idempotent() {
    let t = init_test_db();
    seed_appeal(&t.db, "a1", "TN123", 100);
    let r = resolution(AppealStatus::Approved, Some("Valid receipt"));

    update_appeal_status(&t.db, &r).unwrap();
    let first = documents::get_doc(&t.db, APPEALS, "a1").unwrap().unwrap();
    update_appeal_status(&t.db, &r).unwrap();
    let second = documents::get_doc(&t.db, APPEALS, "a1").unwrap().unwrap();

    assert_eq!(first, second);
}

#[test]
fn missing_reason_keeps_previous_reason() {
    let t = init_test_db();
    seed_appeal(&t.db, "a1", "TN123", 100);

    update_appeal_status(&t.db, &resolution(AppealStatus::Rejected, Some("First pass"))).unwrap();
    update_appeal_status(&t.db, &resolution(AppealStatus::Approved, None)).unwrap();

    let appeal = stored_appeal(&t.db, "a1");
    assert_eq!(appeal.status, AppealStatus::Approved);
    assert_eq!(appeal.reason.as_deref(), Some("First pass"));
}

#[test]
fn resolution_is_validated_before_the_store() {
    let db = broken_db();

    let mut r = resolution(AppealStatus::Approved, None);
    r.document_id.clear();
    assert!(matches!(update_appeal_status(&db, &r), Err(ServerError::Validation(_))));

    let mut r = resolution(AppealStatus::Approved, None);
    r.current_user_id.clear();
    assert!(matches!(update_appeal_status(&db, &r), Err(ServerError::Validation(_))));

    let r = resolution(AppealStatus::Pending, None);
    assert!(matches!(update_appeal_status(&db, &r), Err(ServerError::Validation(_))));
}

#[test]
fn resolving_a_missing_appeal_is_not_found() {
    let t = init_test_db();
    let err = update_appeal_status(&t.db, &resolution(AppealStatus::Approved, None)).unwrap_err();
    assert_eq!(err, ServerError::NotFound);
}

#[test]
fn resolving_leaves_the_report_untouched() {
    let t = init_test_db();
    seed_report(&t.db, "r1", "ABC123", "TN123", 50);
    seed_appeal(&t.db, "a1", "TN123", 100);
    let before = documents::get_doc(&t.db, REPORTS, "r1").unwrap();

    update_appeal_status(&t.db, &resolution(AppealStatus::Approved, None)).unwrap();

    assert_eq!(documents::get_doc(&t.db, REPORTS, "r1").unwrap(), before);
}

#[test]
fn listing_pages_newest_first_and_searches_by_tracking_number() {
    let t = init_test_db();
    seed_appeal(&t.db, "a1", "TN1", 100);
    seed_appeal(&t.db, "a2", "TN2", 300);
    seed_appeal(&t.db, "a3", "TN1", 200);

    let first = get_appeals(&t.db, 2, None, "");
    let ids: Vec<_> = first.appeals.iter().map(|a| a.document_id.as_str()).collect();
    assert_eq!(ids, vec!["a2", "a3"]);
    assert_eq!(first.total_count, 3);

    let rest = get_appeals(&t.db, 2, first.last_doc.as_ref(), "");
    let ids: Vec<_> = rest.appeals.iter().map(|a| a.document_id.as_str()).collect();
    assert_eq!(ids, vec!["a1"]);

    let search = get_appeals(&t.db, 10, None, "tn1");
    let ids: Vec<_> = search.appeals.iter().map(|a| a.document_id.as_str()).collect();
    assert_eq!(ids, vec!["a3", "a1"]);
    assert_eq!(search.total_count, 2);
}

#[test]
fn listing_failure_degrades_to_empty_page() {
    assert_eq!(get_appeals(&broken_db(), 10, None, ""), AppealPage::default());
}

#[test]
fn loosely_typed_appeals_still_list() {
    let t = init_test_db();
    seed_appeal(&t.db, "a1", "TN1", 100);
    seed_doc(
        &t.db,
        APPEALS,
        "a2",
        json!({
            "violationTrackingNumber": null,
            "status": "Pending",
            "reason": null,
            "currentUserId": 42,
            "createdAt": native(200)
        }),
    );
    seed_doc(
        &t.db,
        APPEALS,
        "a3",
        json!({ "status": "Withdrawn", "createdAt": native(300) }),
    );

    let page = get_appeals(&t.db, 10, None, "");
    let ids: Vec<_> = page.appeals.iter().map(|a| a.document_id.as_str()).collect();
    assert_eq!(ids, vec!["a2", "a1"]);
    assert_eq!(page.total_count, 3);
    assert_eq!(page.appeals[0].violation_tracking_number, "");
    assert_eq!(page.appeals[0].reason, None);
    assert_eq!(page.appeals[0].current_user_id.as_deref(), Some("42"));
}
