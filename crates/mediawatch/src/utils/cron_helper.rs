//! Cron utility functions for calculating next scheduled times
//!
//! This module provides utilities for working with cron expressions
//! to calculate next scheduled update times.

use chrono::{DateTime, TimeZone, Utc};
use cron::Schedule;
use std::str::FromStr;

/// Calculate the next scheduled update time from a cron expression
/// 
/// # Arguments
/// * `cron_expression` - A valid cron expression string
/// 
/// # Returns
/// * `Some(DateTime<Utc>)` - The next scheduled time if the expression is valid
/// * `None` - If the cron expression is invalid or has no future schedules
pub fn calculate_next_scheduled_time(cron_expression: &str) -> Option<DateTime<Utc>> {
    match Schedule::from_str(cron_expression) {
        Ok(schedule) => {
            schedule.upcoming(Utc).next()
        }
        Err(_) => {
            // Invalid cron expression
            None
        }
    }
}

/// Calculate the next scheduled update time from a cron expression with validation
/// 
/// # Arguments
/// * `cron_expression` - A valid cron expression string
/// 
/// # Returns
/// * `Ok(Some(DateTime<Utc>))` - The next scheduled time
/// * `Ok(None)` - Valid cron but no future schedules
/// * `Err(String)` - Invalid cron expression with error message
pub fn calculate_next_scheduled_time_validated(cron_expression: &str) -> Result<Option<DateTime<Utc>>, String> {
    match Schedule::from_str(cron_expression) {
        Ok(schedule) => {
            Ok(schedule.upcoming(Utc).next())
        }
        Err(e) => {
            Err(format!("Invalid cron expression '{cron_expression}': {e}"))
        }
    }
}

/// Calculate the next scheduled time in an arbitrary timezone, validating
/// the cron expression. The Scheduler needs its triggers evaluated
/// against the configured `TIMEZONE` rather than UTC, so this generalizes
/// [`calculate_next_scheduled_time_validated`] over any `chrono::TimeZone`.
///
/// # Returns
/// * `Ok(Some(DateTime<Tz>))` - The next scheduled time
/// * `Ok(None)` - Valid cron but no future schedules
/// * `Err(String)` - Invalid cron expression with error message
pub fn calculate_next_scheduled_time_in_tz<Tz>(cron_expression: &str, tz: Tz) -> Result<Option<DateTime<Tz>>, String>
where
    Tz: TimeZone,
{
    match Schedule::from_str(cron_expression) {
        Ok(schedule) => Ok(schedule.upcoming(tz).next()),
        Err(e) => Err(format!("Invalid cron expression '{cron_expression}': {e}")),
    }
}
