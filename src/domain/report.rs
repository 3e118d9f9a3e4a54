// src/domain/report.rs

use crate::domain::{lenient, timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNKNOWN_ENFORCER: &str = "Unknown Enforcer";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    #[default]
    Submitted,
    Paid,
    Overturned,
    Cancelled,
}

/// Payment state. Independent of [`ReportStatus`]; nothing couples the two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Refunded,
    Cancelled,
}

/// One violation entry on a report. Everything besides the name is carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(default, deserialize_with = "lenient::string")]
    pub violation_name: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// A filed traffic-violation record as read from the `reports` collection.
///
/// Other clients write these documents without a schema, so every field
/// decodes leniently. Fields not modelled here (`birthdate`, `confiscated`,
/// ...) are kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    // Domain id, distinct from the store's document key.
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Store-assigned key. Filled from the document, never from the body.
    #[serde(default)]
    pub document_id: String,

    // Subject
    #[serde(default, deserialize_with = "lenient::string")]
    pub fullname: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub license_number: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub plate_number: String,

    // Photos
    #[serde(default, deserialize_with = "lenient::string")]
    pub license_photo: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub plate_photo: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub evidence_photo: String,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub created_by_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub enforcer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub enforcer_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::or_default")]
    pub violations: Vec<Violation>,

    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::lenient", skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::lenient", skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::lenient", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub draft_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub payment_reference_id: Option<String>,

    // Unknown status strings fail the document; listings skip it.
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,

    // Optional violation details
    #[serde(default, deserialize_with = "lenient::opt_u32", skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub place_of_violation: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Report {
    /// Creation time in millis, epoch 0 when missing or unparseable.
    pub fn created_millis(&self) -> i64 {
        timestamp::millis_or_epoch(self.created_at.as_ref())
    }

    pub fn needs_enforcer_name(&self) -> bool {
        let has_id = self.enforcer_id.as_deref().is_some_and(|id| !id.is_empty());
        let has_name = self.enforcer_name.as_deref().is_some_and(|n| !n.is_empty());
        has_id && !has_name
    }
}

/// Input for creating a report. Tracking number, enforcer linkage, creation
/// time and statuses are assigned by the service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub license_number: String,
    #[serde(default)]
    pub plate_number: String,
    #[serde(default)]
    pub license_photo: String,
    #[serde(default)]
    pub plate_photo: String,
    #[serde(default)]
    pub evidence_photo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_id: Option<String>,
    #[serde(default)]
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_of_violation: Option<String>,
    /// Extra fields from the filing client (`birthdate`, `confiscated`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
