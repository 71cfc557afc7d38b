// src/health/mod.rs
mod checker;
pub mod probe;
pub mod report;
mod status;

pub use checker::{count_matching_processes, HealthEvaluator, HealthReport, PRODUCT_NAME};
pub use probe::{CommandProbe, SystemProbe};
pub use status::{overall_status, reduce, CheckResult, HealthStatus};
