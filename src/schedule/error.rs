use chrono::NaiveDate;
use thiserror::Error;

use super::types::{DayOfWeek, TimeOfDay};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Invalid time of day: {0} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Invalid day of week: {0}")]
    InvalidDayOfWeek(String),

    #[error("Date range is inverted: {start} is after {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("Date range spans {days} days, maximum is {max}")]
    RangeTooLong { days: i64, max: i64 },

    #[error("Schedule {index} on {day}: end time {end} is not after start time {start}")]
    EndNotAfterStart {
        index: usize,
        day: DayOfWeek,
        start: TimeOfDay,
        end: TimeOfDay,
    },

    #[error("Schedules {first} and {second} overlap on {day}")]
    Overlap {
        first: usize,
        second: usize,
        day: DayOfWeek,
    },
}

impl ScheduleError {
    /// Field path within a schedule request that this error points at, if any
    pub fn field(&self) -> Option<String> {
        match self {
            ScheduleError::InvertedRange { .. } | ScheduleError::RangeTooLong { .. } => {
                Some("rangeEnd".to_string())
            }
            ScheduleError::EndNotAfterStart { index, .. } => {
                Some(format!("schedules[{}].endTime", index))
            }
            ScheduleError::Overlap { second, .. } => Some(format!("schedules[{}].startTime", second)),
            ScheduleError::InvalidTime(_) | ScheduleError::InvalidDayOfWeek(_) => None,
        }
    }
}
