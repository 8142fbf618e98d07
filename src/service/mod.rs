//! Resource services: cache-backed queries and single-round-trip mutations per entity.
//!
//! Every query goes through `QueryCache::fetch` under a semantic key. Every successful mutation
//! invalidates the key prefixes whose data may now be stale; a failed mutation invalidates nothing.

mod activities;
mod announcements;
mod children;
mod classrooms;
mod documents;
mod meals;
mod messages;
mod notifications;
mod settings;
mod users;
mod validation;
mod wellbeing;

pub use activities::{ActivitiesService, ActivityFilter};
pub use announcements::{AnnouncementFilter, AnnouncementsService};
pub use children::{ChildFilter, ChildrenService};
pub use classrooms::{merge_teacher_classrooms, ClassroomsService};
pub use documents::{DocumentFilter, DocumentsService};
pub use meals::{MealFilter, MealsService};
pub use messages::MessagesService;
pub use notifications::{NotificationSubscription, NotificationsService};
pub use settings::SettingsService;
pub use users::{UserFilter, UsersService};
pub use validation::*;
pub use wellbeing::{WellbeingFilter, WellbeingService};

use crate::backend::{from_row, from_rows, Filter, Query, Row};
use crate::cache::QueryKey;
use crate::client::CareClient;
use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

pub(crate) fn id_filter(id: &Uuid) -> Vec<Filter> {
    vec![Filter::Eq("id".into(), id.to_string().into())]
}

/// Cached list query.
pub(crate) async fn fetch_list<T>(client: &CareClient, key: QueryKey, query: Query) -> Result<Vec<T>, AppError>
where
    T: Serialize + DeserializeOwned,
{
    client
        .cache()
        .fetch(key, || async {
            let rows = client.backend().select(&query).await?;
            from_rows(rows)
        })
        .await
}

/// Cached by-id lookup; `NotFound` when the row does not exist. Ignores soft-delete flags.
pub(crate) async fn fetch_by_id<T>(client: &CareClient, key: QueryKey, table: &str, kind: &str, id: &Uuid) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
{
    client
        .cache()
        .fetch(key, || async {
            let row = select_by_id(client, table, id)
                .await?
                .ok_or_else(|| AppError::not_found(kind, id))?;
            from_row(row)
        })
        .await
}

/// Uncached single-row read, for mutations that must see the backend's current state.
pub(crate) async fn select_by_id(client: &CareClient, table: &str, id: &Uuid) -> Result<Option<Row>, AppError> {
    let rows = client
        .backend()
        .select(&Query::table(table).eq("id", id.to_string()).limit(1))
        .await?;
    Ok(rows.into_iter().next())
}

pub(crate) async fn insert_row<T: DeserializeOwned>(client: &CareClient, table: &str, row: Row) -> Result<T, AppError> {
    let stored = client.backend().insert(table, row).await?;
    from_row(stored)
}

/// Patch one row by id; `NotFound` when no row matched.
pub(crate) async fn update_by_id<T: DeserializeOwned>(
    client: &CareClient,
    table: &str,
    kind: &str,
    id: &Uuid,
    patch: Row,
) -> Result<T, AppError> {
    let rows = client.backend().update(table, &id_filter(id), patch).await?;
    let row = rows.into_iter().next().ok_or_else(|| AppError::not_found(kind, id))?;
    from_row(row)
}

/// Hard delete by id; `NotFound` when no row matched. Returns the removed row.
pub(crate) async fn delete_by_id<T: DeserializeOwned>(client: &CareClient, table: &str, kind: &str, id: &Uuid) -> Result<T, AppError> {
    let rows = client.backend().delete(table, &id_filter(id)).await?;
    let row = rows.into_iter().next().ok_or_else(|| AppError::not_found(kind, id))?;
    from_row(row)
}

pub(crate) fn now_value() -> serde_json::Value {
    serde_json::Value::String(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
}
