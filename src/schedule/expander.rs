use tracing::debug;
use uuid::Uuid;

use super::error::ScheduleError;
use super::range::DateRange;
use super::types::{ExpansionContext, ExpansionRequest, GeneratedSession, WeeklySchedule};

/// Turns weekly recurring schedules into dated sessions for one integration.
///
/// Sessions are produced schedule by schedule, in input order, each schedule's
/// matches ascending by date. The result is not globally chronological; sort
/// by `start_date` when that matters. An `end_time` earlier than `start_time`
/// is carried through as-is (see `validate` for the upstream check).
#[derive(Debug, Clone)]
pub struct SessionExpander {
    max_range_days: Option<i64>,
    new_id: fn() -> Uuid,
}

impl Default for SessionExpander {
    fn default() -> Self {
        Self { max_range_days: None, new_id: Uuid::new_v4 }
    }
}

impl SessionExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject ranges longer than `days` before enumerating them
    pub fn with_max_range_days(mut self, days: Option<i64>) -> Self {
        self.max_range_days = days;
        self
    }

    /// Replace the session id source (defaults to random v4 ids)
    pub fn with_id_source(mut self, new_id: fn() -> Uuid) -> Self {
        self.new_id = new_id;
        self
    }

    pub fn expand(
        &self,
        range: &DateRange,
        schedules: &[WeeklySchedule],
        context: &ExpansionContext,
    ) -> Result<Vec<GeneratedSession>, ScheduleError> {
        if let Some(max) = self.max_range_days {
            let days = range.len_days();
            if days > max {
                return Err(ScheduleError::RangeTooLong { days, max });
            }
        }

        let mut sessions = Vec::new();
        for schedule in schedules {
            let matching = range.days().filter(|date| schedule.day_of_week.matches(*date));
            sessions.extend(matching.map(|date| GeneratedSession {
                id: (self.new_id)(),
                classroom_integration_id: context.integration_id,
                teacher_id: context.teacher_id,
                start_date: schedule.start_time.on(date),
                end_date: schedule.end_time.on(date),
                description: None,
                lesson_ids: Vec::new(),
            }));
        }

        debug!(
            "Expanded {} schedules over {}..={} into {} sessions for integration {}",
            schedules.len(),
            range.start(),
            range.end(),
            sessions.len(),
            context.integration_id
        );
        Ok(sessions)
    }

    /// Expand a wire-level request, validating its date range first
    pub fn expand_request(&self, request: &ExpansionRequest) -> Result<Vec<GeneratedSession>, ScheduleError> {
        let range = DateRange::new(request.range_start, request.range_end)?;
        self.expand(&range, &request.schedules, &request.context())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::{DayOfWeek, TimeOfDay};
    use chrono::{Datelike, NaiveDate, Timelike};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule(day: DayOfWeek, start: &str, end: &str) -> WeeklySchedule {
        WeeklySchedule::new(day, start.parse().unwrap(), end.parse().unwrap())
    }

    fn context() -> ExpansionContext {
        ExpansionContext { integration_id: Uuid::new_v4(), teacher_id: Some(Uuid::new_v4()) }
    }

    #[test]
    fn two_weeks_of_mondays() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 14)).unwrap();
        let ctx = context();
        let sessions = SessionExpander::new()
            .expand(&range, &[schedule(DayOfWeek::Monday, "09:00", "10:00")], &ctx)
            .unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].start_date.to_rfc3339(), "2024-01-01T09:00:00+00:00");
        assert_eq!(sessions[0].end_date.to_rfc3339(), "2024-01-01T10:00:00+00:00");
        assert_eq!(sessions[1].start_date.to_rfc3339(), "2024-01-08T09:00:00+00:00");
        assert_eq!(sessions[1].end_date.to_rfc3339(), "2024-01-08T10:00:00+00:00");
        for session in &sessions {
            assert_eq!(session.classroom_integration_id, ctx.integration_id);
            assert_eq!(session.teacher_id, ctx.teacher_id);
            assert!(session.lesson_ids.is_empty());
            assert!(session.description.is_none());
        }
        assert_ne!(sessions[0].id, sessions[1].id);
    }

    #[test]
    fn empty_schedules_yield_nothing() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 12, 31)).unwrap();
        let sessions = SessionExpander::new().expand(&range, &[], &context()).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn output_is_grouped_by_schedule_not_by_date() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 14)).unwrap();
        let schedules = [
            schedule(DayOfWeek::Wednesday, "13:00", "14:00"),
            schedule(DayOfWeek::Monday, "09:00", "10:00"),
        ];
        let sessions = SessionExpander::new().expand(&range, &schedules, &context()).unwrap();
        let days: Vec<u32> = sessions.iter().map(|s| s.start_date.day()).collect();
        assert_eq!(days, vec![3, 10, 1, 8]);
    }

    #[test]
    fn end_before_start_is_carried_through() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        let sessions = SessionExpander::new()
            .expand(&range, &[schedule(DayOfWeek::Monday, "11:00", "10:00")], &context())
            .unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].end_date < sessions[0].start_date);
        assert_eq!(sessions[0].end_date.date_naive(), date(2024, 1, 1));
    }

    #[test]
    fn single_day_range_not_matching_is_empty() {
        let range = DateRange::new(date(2024, 1, 2), date(2024, 1, 2)).unwrap();
        let sessions = SessionExpander::new()
            .expand(&range, &[schedule(DayOfWeek::Monday, "09:00", "10:00")], &context())
            .unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn seconds_are_zeroed() {
        let range = DateRange::new(date(2024, 3, 4), date(2024, 3, 4)).unwrap();
        let sessions = SessionExpander::new()
            .expand(&range, &[schedule(DayOfWeek::Monday, "07:15", "08:45")], &context())
            .unwrap();
        let start = sessions[0].start_date;
        assert_eq!((start.hour(), start.minute(), start.second(), start.nanosecond()), (7, 15, 0, 0));
    }

    #[test]
    fn rejects_ranges_over_the_limit() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let err = SessionExpander::new()
            .with_max_range_days(Some(30))
            .expand(&range, &[], &context())
            .unwrap_err();
        assert_eq!(err, ScheduleError::RangeTooLong { days: 31, max: 30 });
    }

    #[test]
    fn uses_injected_id_source() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        let sessions = SessionExpander::new()
            .with_id_source(Uuid::nil)
            .expand(&range, &[schedule(DayOfWeek::Monday, "09:00", "10:00")], &context())
            .unwrap();
        assert_eq!(sessions[0].id, Uuid::nil());
    }

    #[test]
    fn repeated_expansion_differs_only_in_ids() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 2, 29)).unwrap();
        let schedules = [
            schedule(DayOfWeek::Tuesday, "08:00", "08:45"),
            schedule(DayOfWeek::Friday, "14:30", "15:15"),
        ];
        let ctx = context();
        let expander = SessionExpander::new();
        let first = expander.expand(&range, &schedules, &ctx).unwrap();
        let second = expander.expand(&range, &schedules, &ctx).unwrap();

        let content = |sessions: &[GeneratedSession]| -> Vec<_> {
            sessions
                .iter()
                .map(|s| (s.start_date.date_naive(), s.start_date, s.end_date, s.teacher_id))
                .collect()
        };
        assert_eq!(content(&first), content(&second));
        assert!(first.iter().zip(&second).all(|(a, b)| a.id != b.id));
    }

    #[test]
    fn count_matches_weekdays_in_range() {
        let ranges = [
            (date(2024, 1, 1), date(2024, 1, 1)),
            (date(2024, 1, 3), date(2024, 1, 9)),
            (date(2024, 2, 20), date(2024, 3, 5)),
            (date(2023, 12, 25), date(2024, 2, 10)),
            (date(2024, 1, 1), date(2024, 12, 31)),
        ];
        let expander = SessionExpander::new();
        for (start, end) in ranges {
            let range = DateRange::new(start, end).unwrap();
            for day in DayOfWeek::ALL {
                let sessions = expander
                    .expand(&range, &[schedule(day, "09:00", "10:00")], &context())
                    .unwrap();
                let expected = range.days().filter(|d| day.matches(*d)).count();
                assert_eq!(sessions.len(), expected, "{} over {}..={}", day, start, end);
                assert!(sessions.iter().all(|s| day.matches(s.start_date.date_naive())));
            }
        }
    }

    #[test]
    fn expand_request_rejects_inverted_range() {
        let request = ExpansionRequest {
            range_start: date(2024, 2, 1),
            range_end: date(2024, 1, 1),
            schedules: vec![WeeklySchedule::new(
                DayOfWeek::Monday,
                TimeOfDay::new(9, 0).unwrap(),
                TimeOfDay::new(10, 0).unwrap(),
            )],
            integration_id: Uuid::new_v4(),
            teacher_id: None,
        };
        let err = SessionExpander::new().expand_request(&request).unwrap_err();
        assert!(matches!(err, ScheduleError::InvertedRange { .. }));
    }
}
