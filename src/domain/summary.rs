// src/domain/summary.rs

use crate::domain::report::{Report, ReportStatus};
use serde::Serialize;

/// Totals shown above an enforcer's or driver's report list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_reports: usize,
    pub total_violations: usize,
    pub paid_reports: usize,
    pub submitted_reports: usize,
}

impl ReportSummary {
    pub fn from_reports(reports: &[Report]) -> Self {
        reports.iter().fold(Self::default(), |mut acc, r| {
            acc.total_reports += 1;
            acc.total_violations += r.violations.len();
            match r.status {
                ReportStatus::Paid => acc.paid_reports += 1,
                ReportStatus::Submitted => acc.submitted_reports += 1,
                _ => {}
            }
            acc
        })
    }
}
