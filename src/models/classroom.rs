use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classroom {
    pub id: Uuid,
    pub name: String,
    /// Primary teacher.
    pub teacher_id: Option<Uuid>,
    pub capacity: Option<i32>,
    pub age_group: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewClassroom {
    pub name: String,
    #[serde(default)]
    pub teacher_id: Option<Uuid>,
    #[serde(default)]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub age_group: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClassroomPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
}

/// Co-teacher link row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeacherClassroom {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub classroom_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeachingRole {
    Primary,
    CoTeacher,
}

impl TeachingRole {
    pub fn label(&self) -> &'static str {
        match self {
            TeachingRole::Primary => "Primary teacher",
            TeachingRole::CoTeacher => "Co-teacher",
        }
    }
}

/// A classroom a teacher works in, tagged with how they are attached to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeacherClassroomAssignment {
    pub classroom: Classroom,
    pub role: TeachingRole,
}
