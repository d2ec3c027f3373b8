use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Classroom, ClassroomIntegration, SessionPatch, SessionRow, WeeklyScheduleRow};
use crate::database::repository::{decode, encode, Repository, Row};
use crate::filter::FilterData;
use crate::schedule::{
    validate_schedules, DateRange, ExpansionContext, ExpansionRequest, GeneratedSession, ScheduleError,
    SessionExpander, ValidationRules, WeeklySchedule,
};

pub const CLASSROOMS: &str = "classrooms";
pub const INTEGRATIONS: &str = "classroom_integrations";
pub const WEEKLY_SCHEDULES: &str = "weekly_schedules";
pub const SESSIONS: &str = "classroom_integration_sessions";

#[derive(Debug, thiserror::Error)]
pub enum ClassroomServiceError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("{} schedule problems found", .0.len())]
    InvalidSchedules(Vec<ScheduleError>),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Patch must change at least one field")]
    EmptyPatch,
}

pub type ServiceResult<T> = Result<T, ClassroomServiceError>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOutcome {
    pub integration_id: Uuid,
    pub schedules: Vec<WeeklySchedule>,
    pub sessions_created: usize,
    pub sessions_discarded: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeOutcome {
    pub classroom_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub integrations_regenerated: usize,
    pub sessions_created: usize,
    pub sessions_discarded: u64,
}

/// Classroom scheduling workflows. The repository it is given is expected to
/// be soft-delete aware, so deleted classrooms, integrations and sessions
/// read as missing.
#[derive(Clone)]
pub struct ClassroomService {
    repo: Arc<dyn Repository>,
    expander: SessionExpander,
    rules: ValidationRules,
}

impl ClassroomService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            repo,
            expander: SessionExpander::new().with_max_range_days(crate::config::config().schedule.max_range_days),
            rules: ValidationRules::from_config(),
        }
    }

    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_expander(mut self, expander: SessionExpander) -> Self {
        self.expander = expander;
        self
    }

    fn check(&self, schedules: &[WeeklySchedule]) -> ServiceResult<()> {
        let errors = validate_schedules(schedules, self.rules);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ClassroomServiceError::InvalidSchedules(errors))
        }
    }

    /// Validate and expand without touching storage
    pub fn preview(&self, request: &ExpansionRequest) -> ServiceResult<Vec<GeneratedSession>> {
        self.check(&request.schedules)?;
        Ok(self.expander.expand_request(request)?)
    }

    /// Replace an integration's weekly schedules and rebuild its sessions.
    /// Nothing is written unless the expansion succeeds.
    pub async fn save_schedules(&self, integration_id: Uuid, schedules: Vec<WeeklySchedule>) -> ServiceResult<ScheduleOutcome> {
        self.check(&schedules)?;
        let integration = self.integration(integration_id).await?;
        let classroom = self.classroom(integration.classroom_id).await?;
        let range = DateRange::new(classroom.start_date, classroom.end_date)?;
        let plan = self.plan(&integration, &range, &schedules)?;

        let now = Utc::now();
        let rows = schedules
            .iter()
            .map(|s| encode(&WeeklyScheduleRow::from_schedule(integration.id, s, now)))
            .collect::<Result<Vec<_>, _>>()?;
        self.repo
            .replace_where(WEEKLY_SCHEDULES, json!({ "classroom_integration_id": integration.id }), rows)
            .await?;

        let (sessions_created, sessions_discarded) = self.apply(plan).await?;
        Ok(ScheduleOutcome { integration_id, schedules, sessions_created, sessions_discarded })
    }

    /// Move a classroom's date range and rebuild every live integration's
    /// sessions. All integrations are expanded against the new range before
    /// the classroom or any session is written.
    pub async fn update_classroom_range(&self, classroom_id: Uuid, start: NaiveDate, end: NaiveDate) -> ServiceResult<RangeOutcome> {
        let range = DateRange::new(start, end)?;
        self.classroom(classroom_id).await?;

        let integrations = self
            .repo
            .select_any(INTEGRATIONS, FilterData::where_eq("classroom_id", json!(classroom_id)))
            .await?;
        let mut plans = Vec::with_capacity(integrations.len());
        for row in integrations {
            let integration: ClassroomIntegration = decode(row)?;
            let schedules = self.stored_schedules(integration.id).await?;
            plans.push(self.plan(&integration, &range, &schedules)?);
        }

        let changes: Row = [
            ("start_date".to_string(), json!(start)),
            ("end_date".to_string(), json!(end)),
            ("updated_at".to_string(), json!(Utc::now())),
        ]
        .into_iter()
        .collect();
        self.repo
            .update_one(CLASSROOMS, classroom_id, changes)
            .await?
            .ok_or_else(|| ClassroomServiceError::NotFound(format!("classroom {} not found", classroom_id)))?;

        let mut outcome = RangeOutcome {
            classroom_id,
            start_date: start,
            end_date: end,
            integrations_regenerated: 0,
            sessions_created: 0,
            sessions_discarded: 0,
        };
        for plan in plans {
            let (created, discarded) = self.apply(plan).await?;
            outcome.integrations_regenerated += 1;
            outcome.sessions_created += created;
            outcome.sessions_discarded += discarded;
        }
        Ok(outcome)
    }

    /// Live sessions of an integration, earliest first
    pub async fn list_sessions(&self, integration_id: Uuid) -> ServiceResult<Vec<GeneratedSession>> {
        self.integration(integration_id).await?;
        let filter = FilterData::where_eq("classroom_integration_id", json!(integration_id)).order_by("start_date asc");
        let rows = self.repo.select_any(SESSIONS, filter).await?;
        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            sessions.push(decode::<SessionRow>(row)?.into_session());
        }
        Ok(sessions)
    }

    pub async fn update_session(&self, session_id: Uuid, patch: SessionPatch) -> ServiceResult<GeneratedSession> {
        if patch.is_empty() {
            return Err(ClassroomServiceError::EmptyPatch);
        }
        self.repo.select_404(SESSIONS, FilterData::by_id(session_id)).await?;

        let mut changes = Row::new();
        if let Some(teacher_id) = patch.teacher_id {
            changes.insert("teacher_id".to_string(), json!(teacher_id));
        }
        if let Some(description) = patch.description {
            changes.insert("description".to_string(), json!(description));
        }
        if let Some(lesson_ids) = patch.lesson_ids {
            changes.insert("lesson_ids".to_string(), json!(lesson_ids));
        }
        changes.insert("updated_at".to_string(), json!(Utc::now()));

        let row = self
            .repo
            .update_one(SESSIONS, session_id, changes)
            .await?
            .ok_or_else(|| ClassroomServiceError::NotFound(format!("session {} not found", session_id)))?;
        Ok(decode::<SessionRow>(row)?.into_session())
    }

    /// Logical delete: the row stays, stamped with `deleted_at`
    pub async fn delete_session(&self, session_id: Uuid) -> ServiceResult<()> {
        self.repo.select_404(SESSIONS, FilterData::by_id(session_id)).await?;
        let now = json!(Utc::now());
        let changes: Row = [("deleted_at".to_string(), now.clone()), ("updated_at".to_string(), now)]
            .into_iter()
            .collect();
        self.repo.update_one(SESSIONS, session_id, changes).await?;
        info!("Session {} marked deleted", session_id);
        Ok(())
    }

    async fn integration(&self, id: Uuid) -> ServiceResult<ClassroomIntegration> {
        let row = self.repo.select_404(INTEGRATIONS, FilterData::by_id(id)).await?;
        Ok(decode(row)?)
    }

    async fn classroom(&self, id: Uuid) -> ServiceResult<Classroom> {
        let row = self.repo.select_404(CLASSROOMS, FilterData::by_id(id)).await?;
        Ok(decode(row)?)
    }

    async fn stored_schedules(&self, integration_id: Uuid) -> ServiceResult<Vec<WeeklySchedule>> {
        let rows = self
            .repo
            .select_any(WEEKLY_SCHEDULES, FilterData::where_eq("classroom_integration_id", json!(integration_id)))
            .await?;
        let mut schedules = Vec::with_capacity(rows.len());
        for row in rows {
            schedules.push(decode::<WeeklyScheduleRow>(row)?.to_schedule()?);
        }
        Ok(schedules)
    }

    /// Expand and encode an integration's sessions without writing them
    fn plan(
        &self,
        integration: &ClassroomIntegration,
        range: &DateRange,
        schedules: &[WeeklySchedule],
    ) -> ServiceResult<Regeneration> {
        let context = ExpansionContext { integration_id: integration.id, teacher_id: integration.teacher_id };
        let now = Utc::now();
        let rows = self
            .expander
            .expand(range, schedules, &context)?
            .into_iter()
            .map(|s| encode(&SessionRow::from_generated(s, now)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Regeneration { integration_id: integration.id, rows })
    }

    /// Full replace of the integration's sessions; manual edits do not survive
    async fn apply(&self, plan: Regeneration) -> ServiceResult<(usize, u64)> {
        let created = plan.rows.len();
        let discarded = self
            .repo
            .replace_where(SESSIONS, json!({ "classroom_integration_id": plan.integration_id }), plan.rows)
            .await?;

        info!(
            "Regenerated sessions for integration {}: {} created, {} previous discarded",
            plan.integration_id, created, discarded
        );
        Ok((created, discarded))
    }
}

/// Session rows for one integration, expanded but not yet stored
struct Regeneration {
    integration_id: Uuid,
    rows: Vec<Row>,
}
