use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::GeneratedSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: Uuid,
    pub classroom_integration_id: Uuid,
    #[serde(default)]
    pub teacher_id: Option<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lesson_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    pub fn from_generated(session: GeneratedSession, now: DateTime<Utc>) -> Self {
        Self {
            id: session.id,
            classroom_integration_id: session.classroom_integration_id,
            teacher_id: session.teacher_id,
            start_date: session.start_date,
            end_date: session.end_date,
            description: session.description,
            lesson_ids: session.lesson_ids,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn into_session(self) -> GeneratedSession {
        GeneratedSession {
            id: self.id,
            classroom_integration_id: self.classroom_integration_id,
            teacher_id: self.teacher_id,
            start_date: self.start_date,
            end_date: self.end_date,
            description: self.description,
            lesson_ids: self.lesson_ids,
        }
    }
}

/// Editable session fields. Absent fields are left alone; an explicit
/// `null` teacher or description clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionPatch {
    #[serde(default, deserialize_with = "present")]
    pub teacher_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub lesson_ids: Option<Vec<Uuid>>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        self.teacher_id.is_none() && self.description.is_none() && self.lesson_ids.is_none()
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: SessionPatch = serde_json::from_value(json!({ "teacherId": null })).unwrap();
        assert_eq!(patch.teacher_id, Some(None));
        assert_eq!(patch.description, None);

        let patch: SessionPatch = serde_json::from_value(json!({})).unwrap();
        assert!(patch.is_empty());

        assert!(serde_json::from_value::<SessionPatch>(json!({ "startDate": "2024-01-01" })).is_err());
    }
}
