pub mod appeal;
pub mod enforcer;
pub mod lenient;
pub mod report;
pub mod summary;
pub mod timestamp;

pub use appeal::{Appeal, AppealResolution, AppealStatus};
pub use enforcer::Enforcer;
pub use report::{NewReport, PaymentStatus, Report, ReportStatus, Violation, UNKNOWN_ENFORCER};
pub use summary::ReportSummary;
