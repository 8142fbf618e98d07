use super::notifications::notify_best_effort;
use super::{delete_by_id, fetch_by_id, fetch_list, insert_row, optional_text, require_text, update_by_id};
use crate::backend::{from_rows, to_row, Query, Row};
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{
    Announcement, AnnouncementPatch, ChildParent, NewAnnouncement, NewNotification, NotificationType, Role, User,
};
use crate::query_key;
use crate::schema::{ANNOUNCEMENTS, CHILDREN, CHILD_PARENTS, USERS};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnnouncementFilter {
    /// Classroom scope; `None` lists every announcement.
    #[serde(default)]
    pub classroom_id: Option<Uuid>,
}

pub struct AnnouncementsService<'a> {
    client: &'a CareClient,
}

impl<'a> AnnouncementsService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        AnnouncementsService { client }
    }

    fn invalidate(&self) {
        self.client.cache().invalidate(&query_key!("announcements"));
    }

    /// Pinned first, then newest.
    pub async fn list(&self, filter: &AnnouncementFilter) -> Result<Vec<Announcement>, AppError> {
        let q = Query::table(ANNOUNCEMENTS)
            .eq_opt("classroom_id", filter.classroom_id.map(|id| id.to_string()))
            .order("is_pinned", false)
            .order("created_at", false);
        fetch_list(self.client, query_key!("announcements", filter.classroom_id), q).await
    }

    pub async fn get(&self, id: &Uuid) -> Result<Announcement, AppError> {
        fetch_by_id(self.client, query_key!("announcements", "by-id", id), ANNOUNCEMENTS, "announcement", id).await
    }

    pub async fn create(&self, input: &NewAnnouncement) -> Result<Announcement, AppError> {
        let mut input = input.clone();
        input.title = require_text("title", &input.title)?;
        input.content = require_text("content", &input.content)?;
        let a: Announcement = insert_row(self.client, ANNOUNCEMENTS, to_row(&input)?).await?;
        tracing::info!(announcement_id = %a.id, classroom_id = ?a.classroom_id, "announcement posted");
        self.invalidate();
        self.notify_audience(&a).await;
        Ok(a)
    }

    pub async fn update(&self, id: &Uuid, patch: &AnnouncementPatch) -> Result<Announcement, AppError> {
        let mut patch = patch.clone();
        patch.title = optional_text("title", patch.title.as_deref())?;
        patch.content = optional_text("content", patch.content.as_deref())?;
        let a = update_by_id(self.client, ANNOUNCEMENTS, "announcement", id, to_row(&patch)?).await?;
        self.invalidate();
        Ok(a)
    }

    pub async fn set_pinned(&self, id: &Uuid, pinned: bool) -> Result<Announcement, AppError> {
        let mut patch = Row::new();
        patch.insert("is_pinned".into(), Value::Bool(pinned));
        let a = update_by_id(self.client, ANNOUNCEMENTS, "announcement", id, patch).await?;
        self.invalidate();
        Ok(a)
    }

    pub async fn delete(&self, id: &Uuid) -> Result<Announcement, AppError> {
        let a = delete_by_id(self.client, ANNOUNCEMENTS, "announcement", id).await?;
        self.invalidate();
        Ok(a)
    }

    async fn audience(&self, a: &Announcement) -> Result<BTreeSet<Uuid>, AppError> {
        let backend = self.client.backend();
        let ids: BTreeSet<Uuid> = match a.classroom_id {
            Some(classroom_id) => {
                let children = backend
                    .select(
                        &Query::table(CHILDREN)
                            .eq("classroom_id", classroom_id.to_string())
                            .eq("is_active", true),
                    )
                    .await?;
                let child_ids: Vec<Value> = children.into_iter().filter_map(|r| r.get("id").cloned()).collect();
                if child_ids.is_empty() {
                    return Ok(BTreeSet::new());
                }
                let links: Vec<ChildParent> =
                    from_rows(backend.select(&Query::table(CHILD_PARENTS).is_in("child_id", child_ids)).await?)?;
                links.into_iter().map(|l| l.parent_id).collect()
            }
            None => {
                let parents: Vec<User> = from_rows(
                    backend
                        .select(
                            &Query::table(USERS)
                                .eq("role", Role::Parent.as_str())
                                .eq("is_active", true),
                        )
                        .await?,
                )?;
                parents.into_iter().map(|u| u.id).collect()
            }
        };
        Ok(ids.into_iter().filter(|id| Some(*id) != a.author_id).collect())
    }

    async fn notify_audience(&self, a: &Announcement) {
        let recipients = match self.audience(a).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(announcement_id = %a.id, error = %e, "announcement audience lookup failed");
                return;
            }
        };
        for user_id in recipients {
            notify_best_effort(
                self.client,
                NewNotification {
                    user_id,
                    notification_type: NotificationType::Announcement,
                    title: a.title.clone(),
                    message: a.content.clone(),
                    link: Some("/announcements".to_string()),
                },
            )
            .await;
        }
    }
}
