// src/domain/appeal.rs

use crate::domain::{lenient, timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Appeal state. An appeal is `Pending` until resolved exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppealStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl AppealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppealStatus::Pending => "Pending",
            AppealStatus::Approved => "Approved",
            AppealStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppealStatus::Pending)
    }
}

impl fmt::Display for AppealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appeal {
    #[serde(default)]
    pub document_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub violation_tracking_number: String,
    #[serde(default)]
    pub status: AppealStatus,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub current_user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
    /// Appellant details and anything else the mobile side stores.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Appeal {
    pub fn created_millis(&self) -> i64 {
        timestamp::millis_or_epoch(self.created_at.as_ref())
    }
}

/// Arguments of one appeal resolution.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealResolution {
    #[serde(default)]
    pub document_id: String,
    pub status: AppealStatus,
    #[serde(default)]
    pub current_user_id: String,
    #[serde(default)]
    pub violation_tracking_number: String,
    #[serde(default)]
    pub reason: Option<String>,
}
