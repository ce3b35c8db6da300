pub mod backup;
pub mod config;
pub mod errors;
pub mod grade;
pub mod record_view;
pub mod save_daily;
pub mod schedule;
pub mod show;
pub mod stats;
