pub mod accounts;
pub mod clusters;
pub mod service_logs;
