use crate::db::connection::{init_db, Database};
use crate::db::documents::{self, APPEALS, ENFORCERS, REPORTS};
use crate::domain::timestamp;
use chrono::{TimeZone, Utc};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

/// A fresh database in its own temp dir. Keep it alive for the whole test.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

/// Initialize a fresh test DB using the production schema
pub fn init_test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("test_db.sqlite");
    let db = Database::new(path.to_string_lossy().into_owned());

    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    TestDb { db, _dir: dir }
}

/// A database whose file can never be opened; every store call fails.
pub fn broken_db() -> Database {
    Database::new("/nonexistent-dir/for/tests/broken.sqlite")
}

pub fn native(secs: i64) -> Value {
    timestamp::to_native(Utc.timestamp_opt(secs, 0).unwrap())
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn report_body(plate: &str, tracking: &str, created_at: Value) -> Value {
    json!({
        "fullname": "Juan Dela Cruz",
        "address": "12 Rizal St",
        "phoneNumber": "09171234567",
        "licenseNumber": "N01-23-456789",
        "plateNumber": plate,
        "trackingNumber": tracking,
        "createdAt": created_at,
        "status": "Submitted",
        "paymentStatus": "Pending",
        "violations": [
            { "violationName": "Reckless Driving", "fine": 1000 }
        ]
    })
}

pub fn seed_doc(db: &Database, collection: &str, id: &str, body: Value) {
    documents::set_doc(db, collection, id, object(body)).expect("Failed to seed document");
}

pub fn seed_report(db: &Database, id: &str, plate: &str, tracking: &str, created_secs: i64) {
    seed_doc(db, REPORTS, id, report_body(plate, tracking, native(created_secs)));
}

pub fn seed_enforcer(db: &Database, id: &str, uuid: Option<&str>, first: &str, last: &str) {
    seed_doc(
        db,
        ENFORCERS,
        id,
        json!({ "uuid": uuid, "firstName": first, "lastName": last }),
    );
}

pub fn seed_appeal(db: &Database, id: &str, tracking: &str, created_secs: i64) {
    seed_doc(
        db,
        APPEALS,
        id,
        json!({
            "violationTrackingNumber": tracking,
            "status": "Pending",
            "createdAt": native(created_secs),
            "appellantName": "Juan Dela Cruz"
        }),
    );
}
