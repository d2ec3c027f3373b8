use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classroom {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A subject taught in a classroom, optionally by a fixed teacher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomIntegration {
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub subject_id: Uuid,
    #[serde(default)]
    pub curriculum_id: Option<Uuid>,
    #[serde(default)]
    pub teacher_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}
