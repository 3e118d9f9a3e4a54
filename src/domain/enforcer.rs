// src/domain/enforcer.rs

use crate::domain::lenient;
use serde::{Deserialize, Serialize};

/// Enforcer identity record. Reports link to it either by document id or by
/// the domain `uuid`, depending on which app version filed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enforcer {
    #[serde(default)]
    pub document_id: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
}

impl Enforcer {
    /// `fullName`, else "first last". `None` when both are blank.
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = self.full_name.as_deref().map(str::trim) {
            if !full.is_empty() {
                return Some(full.to_string());
            }
        }

        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        (!joined.is_empty()).then_some(joined)
    }
}
