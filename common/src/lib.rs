pub mod aggregate;
pub mod config;
pub mod error;
pub mod locate;
pub mod matrix;
pub mod metric;
pub mod plot;

pub const IOPS_PER_KIOPS: f64 = 1000.0;
