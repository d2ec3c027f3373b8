use super::error::ScheduleError;
use super::types::WeeklySchedule;

/// Which checks to run over a schedule set before it is expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub reject_inverted_times: bool,
    pub reject_overlaps: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self { reject_inverted_times: true, reject_overlaps: true }
    }
}

impl ValidationRules {
    pub fn from_config() -> Self {
        let schedule = &crate::config::config().schedule;
        Self {
            reject_inverted_times: schedule.reject_inverted_times,
            reject_overlaps: schedule.reject_overlaps,
        }
    }
}

/// Collect every rule violation in the schedule set, in input order
pub fn validate_schedules(schedules: &[WeeklySchedule], rules: ValidationRules) -> Vec<ScheduleError> {
    let mut errors = Vec::new();

    if rules.reject_inverted_times {
        for (index, schedule) in schedules.iter().enumerate() {
            if schedule.end_time <= schedule.start_time {
                errors.push(ScheduleError::EndNotAfterStart {
                    index,
                    day: schedule.day_of_week,
                    start: schedule.start_time,
                    end: schedule.end_time,
                });
            }
        }
    }

    if rules.reject_overlaps {
        for (second, later) in schedules.iter().enumerate() {
            // Inverted entries have no meaningful interval to compare
            if later.end_time <= later.start_time {
                continue;
            }
            let clash = schedules[..second].iter().position(|earlier| {
                earlier.day_of_week == later.day_of_week
                    && earlier.start_time < earlier.end_time
                    && earlier.start_time < later.end_time
                    && later.start_time < earlier.end_time
            });
            if let Some(first) = clash {
                errors.push(ScheduleError::Overlap { first, second, day: later.day_of_week });
            }
        }
    }

    errors
}
