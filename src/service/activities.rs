//! Daily activity logs and their photos.

use super::{
    delete_by_id, fetch_by_id, fetch_list, insert_row, now_value, select_by_id, update_by_id,
    validate_date_range,
};
use crate::backend::{from_row, to_row, Query, Row};
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{ActivityLog, ActivityLogPatch, ActivityPhoto, NewActivityLog};
use crate::query_key;
use crate::schema::{ACTIVITY_LOGS, ACTIVITY_PHOTOS};
use crate::storage::{object_path, FileUpload, ACTIVITY_PHOTOS_BUCKET};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ActivityFilter {
    #[serde(default)]
    pub child_id: Option<Uuid>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

pub struct ActivitiesService<'a> {
    client: &'a CareClient,
}

impl<'a> ActivitiesService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        ActivitiesService { client }
    }

    fn invalidate(&self) {
        self.client.cache().invalidate_all(&[
            query_key!("activities"),
            query_key!("activity"),
            query_key!("activity-photos"),
        ]);
    }

    pub async fn list(&self, filter: &ActivityFilter) -> Result<Vec<ActivityLog>, AppError> {
        validate_date_range(filter.from, filter.to)?;
        let key = query_key!("activities", filter.child_id, filter.date, filter.from, filter.to);
        let mut q = Query::table(ACTIVITY_LOGS).eq_opt("child_id", filter.child_id.map(|id| id.to_string()));
        if let Some(d) = filter.date {
            q = q.eq("date", d.to_string());
        } else {
            if let Some(f) = filter.from {
                q = q.gte("date", f.to_string());
            }
            if let Some(t) = filter.to {
                q = q.lte("date", t.to_string());
            }
        }
        fetch_list(self.client, key, q.order("date", false).order("created_at", false)).await
    }

    pub async fn get(&self, id: &Uuid) -> Result<ActivityLog, AppError> {
        fetch_by_id(self.client, query_key!("activity", id), ACTIVITY_LOGS, "activity log", id).await
    }

    /// Photos attached to a log, oldest first.
    pub async fn photos(&self, activity_id: &Uuid) -> Result<Vec<ActivityPhoto>, AppError> {
        let q = Query::table(ACTIVITY_PHOTOS)
            .eq("activity_id", activity_id.to_string())
            .order("created_at", true);
        fetch_list(self.client, query_key!("activity-photos", activity_id), q).await
    }

    pub async fn create(&self, input: &NewActivityLog) -> Result<ActivityLog, AppError> {
        let log: ActivityLog = insert_row(self.client, ACTIVITY_LOGS, to_row(input)?).await?;
        tracing::info!(activity_id = %log.id, child_id = %log.child_id, "activity logged");
        self.invalidate();
        Ok(log)
    }

    pub async fn update(&self, id: &Uuid, patch: &ActivityLogPatch) -> Result<ActivityLog, AppError> {
        let log = update_by_id(self.client, ACTIVITY_LOGS, "activity log", id, to_row(patch)?).await?;
        self.invalidate();
        Ok(log)
    }

    /// Parent has seen the log.
    pub async fn acknowledge(&self, id: &Uuid) -> Result<ActivityLog, AppError> {
        let mut patch = Row::new();
        patch.insert("acknowledged".into(), Value::Bool(true));
        patch.insert("acknowledged_at".into(), now_value());
        let log = update_by_id(self.client, ACTIVITY_LOGS, "activity log", id, patch).await?;
        self.invalidate();
        Ok(log)
    }

    /// Removes the log and its photo rows; photo objects are removed best-effort.
    pub async fn delete(&self, id: &Uuid) -> Result<ActivityLog, AppError> {
        let photos: Vec<ActivityPhoto> = crate::backend::from_rows(
            self.client
                .backend()
                .delete(
                    ACTIVITY_PHOTOS,
                    &[crate::backend::Filter::Eq("activity_id".into(), id.to_string().into())],
                )
                .await?,
        )?;
        let log = delete_by_id(self.client, ACTIVITY_LOGS, "activity log", id).await?;
        self.invalidate();
        if !photos.is_empty() {
            let paths: Vec<String> = photos.into_iter().map(|p| p.storage_path).collect();
            if let Err(e) = self.client.storage().remove(ACTIVITY_PHOTOS_BUCKET, &paths).await {
                tracing::warn!(activity_id = %id, error = %e, "activity photo objects left behind");
            }
        }
        Ok(log)
    }

    /// Store the image, then record it against the log with a public URL.
    pub async fn upload_photo(
        &self,
        activity_id: &Uuid,
        file: FileUpload,
        caption: Option<String>,
        uploaded_by: Option<Uuid>,
    ) -> Result<ActivityPhoto, AppError> {
        if select_by_id(self.client, ACTIVITY_LOGS, activity_id).await?.is_none() {
            return Err(AppError::not_found("activity log", activity_id));
        }
        let path = object_path(activity_id, &file, Utc::now());
        let size = file.bytes.len();
        self.client
            .storage()
            .upload(ACTIVITY_PHOTOS_BUCKET, &path, file.bytes, &file.content_type)
            .await?;
        let url = self.client.storage().public_url(ACTIVITY_PHOTOS_BUCKET, &path);

        let mut row = Row::new();
        row.insert("activity_id".into(), Value::String(activity_id.to_string()));
        row.insert("url".into(), Value::String(url));
        row.insert("storage_path".into(), Value::String(path.clone()));
        if let Some(c) = caption.filter(|c| !c.trim().is_empty()) {
            row.insert("caption".into(), Value::String(c.trim().to_string()));
        }
        if let Some(u) = uploaded_by {
            row.insert("uploaded_by".into(), Value::String(u.to_string()));
        }
        let photo: ActivityPhoto = match self.client.backend().insert(ACTIVITY_PHOTOS, row).await {
            Ok(r) => from_row(r)?,
            Err(e) => {
                tracing::warn!(bucket = ACTIVITY_PHOTOS_BUCKET, path = %path, "photo stored but row write failed; object orphaned");
                return Err(e);
            }
        };
        tracing::info!(activity_id = %activity_id, path = %path, bytes = size, "activity photo uploaded");
        self.invalidate();
        Ok(photo)
    }

    pub async fn delete_photo(&self, photo_id: &Uuid) -> Result<ActivityPhoto, AppError> {
        let photo: ActivityPhoto = delete_by_id(self.client, ACTIVITY_PHOTOS, "activity photo", photo_id).await?;
        self.invalidate();
        if let Err(e) = self
            .client
            .storage()
            .remove(ACTIVITY_PHOTOS_BUCKET, std::slice::from_ref(&photo.storage_path))
            .await
        {
            tracing::warn!(photo_id = %photo_id, error = %e, "activity photo object left behind");
        }
        Ok(photo)
    }
}
