//! Small reusable utilities shared across the capture/timeline/slice
//! subsystem.

pub mod cron_helper;
pub mod datetime;
pub mod drift_ring;
pub mod process_tree;

pub use cron_helper::{
    calculate_next_scheduled_time, calculate_next_scheduled_time_in_tz, calculate_next_scheduled_time_validated,
};
pub use drift_ring::DriftRing;
