//! Children and their parent links.

use super::{fetch_by_id, fetch_list, insert_row, optional_text, require_text, select_by_id, update_by_id};
use crate::backend::{from_rows, to_row, Filter, Query};
use crate::cache::QueryKey;
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{Child, ChildParent, ChildPatch, NewChild, Role, User};
use crate::query_key;
use crate::schema::{CHILDREN, CHILD_PARENTS, USERS};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChildFilter {
    #[serde(default)]
    pub classroom_id: Option<Uuid>,
    /// Soft-deleted children are hidden unless set.
    #[serde(default)]
    pub include_inactive: bool,
}

pub struct ChildrenService<'a> {
    client: &'a CareClient,
}

impl<'a> ChildrenService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        ChildrenService { client }
    }

    fn invalidate(&self) {
        self.client.cache().invalidate_all(&[
            query_key!("children"),
            query_key!("child"),
            query_key!("parent-children"),
            query_key!("child-parents"),
        ]);
    }

    /// Children ordered by first then last name.
    pub async fn list(&self, filter: &ChildFilter) -> Result<Vec<Child>, AppError> {
        let key = query_key!("children", filter.classroom_id, filter.include_inactive);
        let mut q = Query::table(CHILDREN).eq_opt("classroom_id", filter.classroom_id.map(|id| id.to_string()));
        if !filter.include_inactive {
            q = q.eq("is_active", true);
        }
        let q = q.order("first_name", true).order("last_name", true);
        fetch_list(self.client, key, q).await
    }

    /// By id, including soft-deleted children.
    pub async fn get(&self, id: &Uuid) -> Result<Child, AppError> {
        fetch_by_id(self.client, query_key!("child", id), CHILDREN, "child", id).await
    }

    /// Active children linked to a parent.
    pub async fn for_parent(&self, parent_id: &Uuid) -> Result<Vec<Child>, AppError> {
        let client = self.client;
        let key: QueryKey = query_key!("parent-children", parent_id);
        client
            .cache()
            .fetch(key, || async {
                let links: Vec<ChildParent> = from_rows(
                    client
                        .backend()
                        .select(&Query::table(CHILD_PARENTS).eq("parent_id", parent_id.to_string()))
                        .await?,
                )?;
                let ids: Vec<Value> = links.iter().map(|l| Value::String(l.child_id.to_string())).collect();
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                let q = Query::table(CHILDREN)
                    .is_in("id", ids)
                    .eq("is_active", true)
                    .order("first_name", true)
                    .order("last_name", true);
                from_rows(client.backend().select(&q).await?)
            })
            .await
    }

    /// Parent profiles linked to a child, ordered by name.
    pub async fn parents(&self, child_id: &Uuid) -> Result<Vec<User>, AppError> {
        let client = self.client;
        client
            .cache()
            .fetch(query_key!("child-parents", child_id), || async {
                let links: Vec<ChildParent> = from_rows(
                    client
                        .backend()
                        .select(&Query::table(CHILD_PARENTS).eq("child_id", child_id.to_string()))
                        .await?,
                )?;
                let ids: Vec<Value> = links.iter().map(|l| Value::String(l.parent_id.to_string())).collect();
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

    pub async fn create(&self, input: &NewChild) -> Result<Child, AppError> {
        let mut input = input.clone();
        input.first_name = require_text("first_name", &input.first_name)?;
        input.last_name = require_text("last_name", &input.last_name)?;
        let mut row = to_row(&input)?;
        row.insert("is_active".into(), Value::Bool(true));
        let child: Child = insert_row(self.client, CHILDREN, row).await?;
        tracing::info!(child_id = %child.id, "child created");
        self.invalidate();
        Ok(child)
    }

    pub async fn update(&self, id: &Uuid, patch: &ChildPatch) -> Result<Child, AppError> {
        let mut patch = patch.clone();
        patch.first_name = optional_text("first_name", patch.first_name.as_deref())?;
        patch.last_name = optional_text("last_name", patch.last_name.as_deref())?;
        let child = update_by_id(self.client, CHILDREN, "child", id, to_row(&patch)?).await?;
        self.invalidate();
        Ok(child)
    }

    /// Soft delete: the row stays reachable by id but leaves default listings.
    pub async fn deactivate(&self, id: &Uuid) -> Result<Child, AppError> {
        self.set_active(id, false).await
    }

    pub async fn reactivate(&self, id: &Uuid) -> Result<Child, AppError> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: &Uuid, active: bool) -> Result<Child, AppError> {
        let mut patch = serde_json::Map::new();
        patch.insert("is_active".into(), Value::Bool(active));
        let child = update_by_id(self.client, CHILDREN, "child", id, patch).await?;
        tracing::info!(child_id = %id, active, "child active flag set");
        self.invalidate();
        Ok(child)
    }

    /// Link a parent account to a child. Linking twice returns the existing link.
    pub async fn link_parent(
        &self,
        child_id: &Uuid,
        parent_id: &Uuid,
        relationship: Option<&str>,
    ) -> Result<ChildParent, AppError> {
        let parent: User = select_by_id(self.client, USERS, parent_id)
            .await?
            .map(crate::backend::from_row)
            .transpose()?
            .ok_or_else(|| AppError::not_found("user", parent_id))?;
        if parent.role != Role::Parent {
            return Err(AppError::Validation(format!("user {} is not a parent", parent_id)));
        }
        if select_by_id(self.client, CHILDREN, child_id).await?.is_none() {
            return Err(AppError::not_found("child", child_id));
        }
        let existing = self
            .client
            .backend()
            .select(
                &Query::table(CHILD_PARENTS)
                    .eq("child_id", child_id.to_string())
                    .eq("parent_id", parent_id.to_string()),
            )
            .await?;
        if let Some(row) = existing.into_iter().next() {
            return crate::backend::from_row(row);
        }
        let mut row = serde_json::Map::new();
        row.insert("child_id".into(), Value::String(child_id.to_string()));
        row.insert("parent_id".into(), Value::String(parent_id.to_string()));
        if let Some(r) = optional_text("relationship", relationship)? {
            row.insert("relationship".into(), Value::String(r));
        }
        let link = insert_row(self.client, CHILD_PARENTS, row).await?;
        self.invalidate();
        Ok(link)
    }

    /// Remove a parent link. Returns whether a link existed.
    pub async fn unlink_parent(&self, child_id: &Uuid, parent_id: &Uuid) -> Result<bool, AppError> {
        let removed = self
            .client
            .backend()
            .delete(
                CHILD_PARENTS,
                &[
                    Filter::Eq("child_id".into(), child_id.to_string().into()),
                    Filter::Eq("parent_id".into(), parent_id.to_string().into()),
                ],
            )
            .await?;
        self.invalidate();
        Ok(!removed.is_empty())
    }
}
