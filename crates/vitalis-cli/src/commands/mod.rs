pub mod audit;
pub mod dispatch;
pub mod migrate;
pub mod record;
pub mod shared;
