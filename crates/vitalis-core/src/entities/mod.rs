//! Entity structs for Vitalis records.
//!
//! Each entity maps to a table in the libSQL database. Internal row ids never
//! appear here; callers only ever see public ids.

mod audit;
mod test_result;

pub use audit::AuditRecord;
pub use test_result::{NewTestResult, TestResult};
