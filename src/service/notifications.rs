//! In-app notifications and the per-user realtime subscription that keeps them fresh.

use super::{delete_by_id, fetch_list, id_filter, insert_row, require_text, select_by_id};
use crate::backend::{from_row, from_rows, to_row, Filter, Query, Row};
use crate::cache::QueryCache;
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{NewNotification, Notification};
use crate::query_key;
use crate::schema::NOTIFICATIONS;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

const LIST_LIMIT: u32 = 50;

pub struct NotificationsService<'a> {
    client: &'a CareClient,
}

/// Live subscription to a user's notification rows. Dropping it stops the listener.
pub struct NotificationSubscription {
    topic: String,
    task: JoinHandle<()>,
}

impl NotificationSubscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl Drop for NotificationSubscription {
    fn drop(&mut self) {
        tracing::info!(topic = %self.topic, "realtime subscription closed");
        self.task.abort();
    }
}

fn invalidate_user(cache: &QueryCache, user_id: &Uuid) {
    cache.invalidate_all(&[
        query_key!("notifications", user_id),
        query_key!("notifications-unread", user_id),
    ]);
}

/// Insert a notification as a side effect of another mutation. Failures are logged, not returned.
pub(crate) async fn notify_best_effort(client: &CareClient, input: NewNotification) {
    let user_id = input.user_id;
    let row = match to_row(&input) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "notification not encoded");
            return;
        }
    };
    match client.backend().insert(NOTIFICATIONS, row).await {
        Ok(_) => invalidate_user(client.cache(), &user_id),
        Err(e) => tracing::warn!(user_id = %user_id, error = %e, "side-effect notification failed"),
    }
}

impl<'a> NotificationsService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        NotificationsService { client }
    }

    /// Newest first, capped at 50.
    pub async fn list(&self, user_id: &Uuid) -> Result<Vec<Notification>, AppError> {
        let q = Query::table(NOTIFICATIONS)
            .eq("user_id", user_id.to_string())
            .order("created_at", false)
            .limit(LIST_LIMIT);
        fetch_list(self.client, query_key!("notifications", user_id), q).await
    }

    pub async fn unread_count(&self, user_id: &Uuid) -> Result<u64, AppError> {
        let client = self.client;
        client
            .cache()
            .fetch(query_key!("notifications-unread", user_id), || async {
                let rows = client
                    .backend()
                    .select(
                        &Query::table(NOTIFICATIONS)
                            .eq("user_id", user_id.to_string())
                            .eq("is_read", false),
                    )
                    .await?;
                Ok(rows.len() as u64)
            })
            .await
    }

    /// Uncached lookup, for ownership checks ahead of a mutation.
    pub async fn get(&self, id: &Uuid) -> Result<Notification, AppError> {
        let row = select_by_id(self.client, NOTIFICATIONS, id)
            .await?
            .ok_or_else(|| AppError::not_found("notification", id))?;
        from_row(row)
    }

    pub async fn create(&self, input: &NewNotification) -> Result<Notification, AppError> {
        let mut input = input.clone();
        input.title = require_text("title", &input.title)?;
        let n: Notification = insert_row(self.client, NOTIFICATIONS, to_row(&input)?).await?;
        invalidate_user(self.client.cache(), &n.user_id);
        Ok(n)
    }

    /// Mark one notification read. Already-read notifications are returned unchanged.
    pub async fn mark_read(&self, id: &Uuid) -> Result<Notification, AppError> {
        let mut filters = id_filter(id);
        filters.push(Filter::Eq("is_read".into(), Value::Bool(false)));
        let mut patch = Row::new();
        patch.insert("is_read".into(), Value::Bool(true));
        let updated = self.client.backend().update(NOTIFICATIONS, &filters, patch).await?;
        let row = match updated.into_iter().next() {
            Some(r) => r,
            None => select_by_id(self.client, NOTIFICATIONS, id)
                .await?
                .ok_or_else(|| AppError::not_found("notification", id))?,
        };
        let n: Notification = from_row(row)?;
        invalidate_user(self.client.cache(), &n.user_id);
        Ok(n)
    }

    /// Mark every unread notification of `user_id` read. Returns how many changed.
    pub async fn mark_all_read(&self, user_id: &Uuid) -> Result<usize, AppError> {
        let filters = [
            Filter::Eq("user_id".into(), user_id.to_string().into()),
            Filter::Eq("is_read".into(), Value::Bool(false)),
        ];
        let mut patch = Row::new();
        patch.insert("is_read".into(), Value::Bool(true));
        let updated: Vec<Notification> = from_rows(self.client.backend().update(NOTIFICATIONS, &filters, patch).await?)?;
        tracing::info!(user_id = %user_id, count = updated.len(), "notifications marked read");
        invalidate_user(self.client.cache(), user_id);
        Ok(updated.len())
    }

    pub async fn delete(&self, id: &Uuid) -> Result<Notification, AppError> {
        let n: Notification = delete_by_id(self.client, NOTIFICATIONS, "notification", id).await?;
        invalidate_user(self.client.cache(), &n.user_id);
        Ok(n)
    }

    /// Listen for inserts/updates/deletes of `user_id`'s notifications and invalidate the
    /// user's list and unread count on each one.
    pub fn subscribe(&self, user_id: &Uuid) -> NotificationSubscription {
        let topic = format!("notifications:{}", user_id);
        let mut channel = self.client.realtime().channel(
            &topic,
            NOTIFICATIONS,
            Some(Filter::Eq("user_id".into(), user_id.to_string().into())),
        );
        let cache: Arc<QueryCache> = self.client.cache_handle();
        let uid = *user_id;
        let task = tokio::spawn(async move {
            while let Some(ev) = channel.recv().await {
                tracing::debug!(topic = %channel.topic(), kind = ?ev.kind, "notification change");
                invalidate_user(&cache, &uid);
            }
        });
        NotificationSubscription { topic, task }
    }
}
