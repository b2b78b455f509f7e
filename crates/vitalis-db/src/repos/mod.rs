//! Repository methods on [`RecordService`](crate::service::RecordService).

pub mod audit;
pub mod test_result;
