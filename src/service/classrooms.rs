//! Classrooms and teacher assignments (primary column plus co-teacher links).

use super::{fetch_by_id, fetch_list, insert_row, optional_text, require_text, select_by_id, update_by_id};
use crate::backend::{from_row, from_rows, to_row, Filter, Query};
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{
    Classroom, ClassroomPatch, NewClassroom, Role, TeacherClassroom, TeacherClassroomAssignment,
    TeachingRole, User,
};
use crate::query_key;
use crate::schema::{CLASSROOMS, TEACHER_CLASSROOMS, USERS};
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

pub struct ClassroomsService<'a> {
    client: &'a CareClient,
}

/// Union of primary and co-teacher classrooms, one entry per classroom id.
/// Primary wins when a teacher is attached both ways. Ordered by classroom name.
pub fn merge_teacher_classrooms(primary: Vec<Classroom>, co: Vec<Classroom>) -> Vec<TeacherClassroomAssignment> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(primary.len() + co.len());
    for (classrooms, role) in [(primary, TeachingRole::Primary), (co, TeachingRole::CoTeacher)] {
        for classroom in classrooms {
            if seen.insert(classroom.id) {
                out.push(TeacherClassroomAssignment { classroom, role });
            }
        }
    }
    out.sort_by(|a, b| a.classroom.name.cmp(&b.classroom.name));
    out
}

impl<'a> ClassroomsService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        ClassroomsService { client }
    }

    fn invalidate(&self) {
        self.client.cache().invalidate_all(&[
            query_key!("classrooms"),
            query_key!("classroom"),
            query_key!("teacher-classrooms"),
            query_key!("classroom-teachers"),
        ]);
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Classroom>, AppError> {
        let mut q = Query::table(CLASSROOMS);
        if !include_inactive {
            q = q.eq("is_active", true);
        }
        fetch_list(self.client, query_key!("classrooms", include_inactive), q.order("name", true)).await
    }

    pub async fn get(&self, id: &Uuid) -> Result<Classroom, AppError> {
        fetch_by_id(self.client, query_key!("classroom", id), CLASSROOMS, "classroom", id).await
    }

    /// Active classrooms a teacher leads or co-teaches.
    pub async fn for_teacher(&self, teacher_id: &Uuid) -> Result<Vec<TeacherClassroomAssignment>, AppError> {
        let client = self.client;
        client
            .cache()
            .fetch(query_key!("teacher-classrooms", teacher_id), || async {
                let primary: Vec<Classroom> = from_rows(
                    client
                        .backend()
                        .select(
                            &Query::table(CLASSROOMS)
                                .eq("teacher_id", teacher_id.to_string())
                                .eq("is_active", true),
                        )
                        .await?,
                )?;
                let links: Vec<TeacherClassroom> = from_rows(
                    client
                        .backend()
                        .select(&Query::table(TEACHER_CLASSROOMS).eq("teacher_id", teacher_id.to_string()))
                        .await?,
                )?;
                let ids: Vec<Value> = links
                    .iter()
                    .map(|l| Value::String(l.classroom_id.to_string()))
                    .collect();
                let co: Vec<Classroom> = if ids.is_empty() {
                    Vec::new()
                } else {
                    from_rows(
                        client
                            .backend()
                            .select(&Query::table(CLASSROOMS).is_in("id", ids).eq("is_active", true))
                            .await?,
                    )?
                };
                Ok(merge_teacher_classrooms(primary, co))
            })
            .await
    }

    /// Co-teachers linked to a classroom (the primary teacher is on the classroom row).
    pub async fn co_teachers(&self, classroom_id: &Uuid) -> Result<Vec<User>, AppError> {
        let client = self.client;
        client
            .cache()
            .fetch(query_key!("classroom-teachers", classroom_id), || async {
                let links: Vec<TeacherClassroom> = from_rows(
                    client
                        .backend()
                        .select(&Query::table(TEACHER_CLASSROOMS).eq("classroom_id", classroom_id.to_string()))
                        .await?,
                )?;
                let ids: Vec<Value> = links.iter().map(|l| Value::String(l.teacher_id.to_string())).collect();
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                from_rows(
                    client
                        .backend()
                        .select(&Query::table(USERS).is_in("id", ids).order("full_name", true))
                        .await?,
                )
            })
            .await
    }

    pub async fn create(&self, input: &NewClassroom) -> Result<Classroom, AppError> {
        let mut input = input.clone();
        input.name = require_text("name", &input.name)?;
        if let Some(t) = &input.teacher_id {
            self.require_teacher(t).await?;
        }
        let mut row = to_row(&input)?;
        row.insert("is_active".into(), Value::Bool(true));
        let classroom: Classroom = insert_row(self.client, CLASSROOMS, row).await?;
        tracing::info!(classroom_id = %classroom.id, "classroom created");
        self.invalidate();
        Ok(classroom)
    }

    pub async fn update(&self, id: &Uuid, patch: &ClassroomPatch) -> Result<Classroom, AppError> {
        let mut patch = patch.clone();
        patch.name = optional_text("name", patch.name.as_deref())?;
        if let Some(t) = &patch.teacher_id {
            self.require_teacher(t).await?;
        }
        let classroom = update_by_id(self.client, CLASSROOMS, "classroom", id, to_row(&patch)?).await?;
        self.invalidate();
        Ok(classroom)
    }

    pub async fn deactivate(&self, id: &Uuid) -> Result<Classroom, AppError> {
        let mut patch = serde_json::Map::new();
        patch.insert("is_active".into(), Value::Bool(false));
        let classroom = update_by_id(self.client, CLASSROOMS, "classroom", id, patch).await?;
        self.invalidate();
        Ok(classroom)
    }

    /// Add a co-teacher. Assigning twice returns the existing link.
    pub async fn assign_teacher(&self, classroom_id: &Uuid, teacher_id: &Uuid) -> Result<TeacherClassroom, AppError> {
        self.require_teacher(teacher_id).await?;
        if select_by_id(self.client, CLASSROOMS, classroom_id).await?.is_none() {
            return Err(AppError::not_found("classroom", classroom_id));
        }
        let existing = self
            .client
            .backend()
            .select(
                &Query::table(TEACHER_CLASSROOMS)
                    .eq("classroom_id", classroom_id.to_string())
                    .eq("teacher_id", teacher_id.to_string()),
            )
            .await?;
        if let Some(row) = existing.into_iter().next() {
            return from_row(row);
        }
        let mut row = serde_json::Map::new();
        row.insert("classroom_id".into(), Value::String(classroom_id.to_string()));
        row.insert("teacher_id".into(), Value::String(teacher_id.to_string()));
        let link = insert_row(self.client, TEACHER_CLASSROOMS, row).await?;
        tracing::info!(classroom_id = %classroom_id, teacher_id = %teacher_id, "co-teacher assigned");
        self.invalidate();
        Ok(link)
    }

    pub async fn unassign_teacher(&self, classroom_id: &Uuid, teacher_id: &Uuid) -> Result<bool, AppError> {
        let removed = self
            .client
            .backend()
            .delete(
                TEACHER_CLASSROOMS,
                &[
                    Filter::Eq("classroom_id".into(), classroom_id.to_string().into()),
                    Filter::Eq("teacher_id".into(), teacher_id.to_string().into()),
                ],
            )
            .await?;
        self.invalidate();
        Ok(!removed.is_empty())
    }

    async fn require_teacher(&self, id: &Uuid) -> Result<(), AppError> {
        let user: User = select_by_id(self.client, USERS, id)
            .await?
            .map(from_row)
            .transpose()?
            .ok_or_else(|| AppError::not_found("user", id))?;
        match user.role {
            Role::Teacher | Role::Admin => Ok(()),
            Role::Parent => Err(AppError::Validation(format!("user {} is not a teacher", id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn classroom(name: &str, id: Uuid) -> Classroom {
        Classroom {
            id,
            name: name.into(),
            teacher_id: None,
            capacity: None,
            age_group: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn primary_wins_and_duplicates_collapse() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let merged = merge_teacher_classrooms(
            vec![classroom("Acorns", a)],
            vec![classroom("Acorns", a), classroom("Bluebells", b)],
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].classroom.id, a);
        assert_eq!(merged[0].role, TeachingRole::Primary);
        assert_eq!(merged[1].role, TeachingRole::CoTeacher);
    }
}
