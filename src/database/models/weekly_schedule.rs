use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::{DayOfWeek, ScheduleError, TimeOfDay, WeeklySchedule};

/// Stored weekly slot. Times persist with seconds, as Postgres `time` renders them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyScheduleRow {
    pub id: Uuid,
    pub classroom_integration_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl WeeklyScheduleRow {
    pub fn from_schedule(integration_id: Uuid, schedule: &WeeklySchedule, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            classroom_integration_id: integration_id,
            day_of_week: schedule.day_of_week,
            start_time: schedule.start_time.as_naive(),
            end_time: schedule.end_time.as_naive(),
            created_at: now,
        }
    }

    pub fn to_schedule(&self) -> Result<WeeklySchedule, ScheduleError> {
        Ok(WeeklySchedule::new(
            self.day_of_week,
            TimeOfDay::new(self.start_time.hour(), self.start_time.minute())?,
            TimeOfDay::new(self.end_time.hour(), self.end_time.minute())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_postgres_time_rendering() {
        let row: WeeklyScheduleRow = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "classroom_integration_id": Uuid::new_v4(),
            "day_of_week": "FRIDAY",
            "start_time": "13:30:00",
            "end_time": "15:00:00",
            "created_at": "2024-01-01T00:00:00+00:00",
        }))
        .unwrap();
        let schedule = row.to_schedule().unwrap();
        assert_eq!(schedule.day_of_week, DayOfWeek::Friday);
        assert_eq!(schedule.start_time.to_string(), "13:30");
        assert_eq!(schedule.end_time.to_string(), "15:00");
    }
}
