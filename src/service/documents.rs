//! Requested documents and their uploaded files (private bucket, signed URLs).

use super::{delete_by_id, fetch_by_id, fetch_list, insert_row, now_value, optional_text, require_text, select_by_id, update_by_id};
use crate::backend::{from_row, to_row, Query, Row};
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{Document, DocumentPatch, DocumentStatus, NewDocument};
use crate::query_key;
use crate::schema::DOCUMENTS;
use crate::storage::{object_path, FileUpload, DOCUMENTS_BUCKET};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DocumentFilter {
    #[serde(default)]
    pub child_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
}

pub struct DocumentsService<'a> {
    client: &'a CareClient,
}

impl<'a> DocumentsService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        DocumentsService { client }
    }

    fn invalidate(&self) {
        self.client.cache().invalidate(&query_key!("documents"));
    }

    async fn load(&self, id: &Uuid) -> Result<Document, AppError> {
        let row = select_by_id(self.client, DOCUMENTS, id)
            .await?
            .ok_or_else(|| AppError::not_found("document", id))?;
        from_row(row)
    }

    /// Soonest due first; documents without a due date last.
    pub async fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>, AppError> {
        let q = Query::table(DOCUMENTS)
            .eq_opt("child_id", filter.child_id.map(|id| id.to_string()))
            .eq_opt("status", filter.status.map(|s| s.as_str()))
            .order("due_date", true)
            .order("created_at", true);
        fetch_list(self.client, query_key!("documents", filter.child_id, filter.status), q).await
    }

    pub async fn get(&self, id: &Uuid) -> Result<Document, AppError> {
        fetch_by_id(self.client, query_key!("documents", "by-id", id), DOCUMENTS, "document", id).await
    }

    /// Request a document; it starts out pending.
    pub async fn create(&self, input: &NewDocument) -> Result<Document, AppError> {
        let mut input = input.clone();
        input.title = require_text("title", &input.title)?;
        input.document_type = require_text("document_type", &input.document_type)?;
        let mut row = to_row(&input)?;
        row.insert("status".into(), Value::String(DocumentStatus::Pending.as_str().into()));
        let doc: Document = insert_row(self.client, DOCUMENTS, row).await?;
        tracing::info!(document_id = %doc.id, child_id = %doc.child_id, "document requested");
        self.invalidate();
        Ok(doc)
    }

    pub async fn update(&self, id: &Uuid, patch: &DocumentPatch) -> Result<Document, AppError> {
        let mut patch = patch.clone();
        patch.title = optional_text("title", patch.title.as_deref())?;
        patch.document_type = optional_text("document_type", patch.document_type.as_deref())?;
        let doc = update_by_id(self.client, DOCUMENTS, "document", id, to_row(&patch)?).await?;
        self.invalidate();
        Ok(doc)
    }

    /// Approve or reject a submitted document.
    pub async fn review(
        &self,
        id: &Uuid,
        decision: DocumentStatus,
        reviewer: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<Document, AppError> {
        if !matches!(decision, DocumentStatus::Approved | DocumentStatus::Rejected) {
            return Err(AppError::Validation(format!(
                "review decision must be approved or rejected, got {}",
                decision.as_str()
            )));
        }
        let doc = self.load(id).await?;
        if doc.status != DocumentStatus::Submitted {
            return Err(AppError::Conflict(format!(
                "document {} is {}, only submitted documents can be reviewed",
                id,
                doc.status.as_str()
            )));
        }
        let mut patch = Row::new();
        patch.insert("status".into(), Value::String(decision.as_str().into()));
        if let Some(r) = reviewer {
            patch.insert("reviewed_by".into(), Value::String(r.to_string()));
        }
        if let Some(n) = optional_text("notes", notes.as_deref())? {
            patch.insert("notes".into(), Value::String(n));
        }
        let doc = update_by_id(self.client, DOCUMENTS, "document", id, patch).await?;
        self.invalidate();
        Ok(doc)
    }

    /// Store the file, then point the document at it and mark it submitted.
    /// A storage failure leaves the document untouched.
    pub async fn upload(&self, id: &Uuid, file: FileUpload) -> Result<Document, AppError> {
        let doc = self.load(id).await?;
        let path = object_path(&doc.child_id, &file, Utc::now());
        let size = file.bytes.len();
        let storage = self.client.storage();
        storage
            .upload(DOCUMENTS_BUCKET, &path, file.bytes, &file.content_type)
            .await?;
        let url = match storage.signed_url(DOCUMENTS_BUCKET, &path, self.client.signed_url_ttl()).await {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(bucket = DOCUMENTS_BUCKET, path = %path, "document stored but not signed; object orphaned");
                return Err(e);
            }
        };

        let mut patch = Row::new();
        patch.insert("status".into(), Value::String(DocumentStatus::Submitted.as_str().into()));
        patch.insert("file_url".into(), Value::String(url));
        patch.insert("storage_path".into(), Value::String(path.clone()));
        patch.insert("submitted_at".into(), now_value());
        let updated: Document = match update_by_id(self.client, DOCUMENTS, "document", id, patch).await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(bucket = DOCUMENTS_BUCKET, path = %path, "document stored but row write failed; object orphaned");
                return Err(e);
            }
        };
        tracing::info!(document_id = %id, path = %path, bytes = size, "document uploaded");
        self.invalidate();

        if let Some(old) = doc.storage_path.filter(|p| *p != path) {
            if let Err(e) = storage.remove(DOCUMENTS_BUCKET, &[old]).await {
                tracing::warn!(document_id = %id, error = %e, "replaced document object left behind");
            }
        }
        Ok(updated)
    }

    /// New signed URL for the stored file. Not persisted.
    pub async fn fresh_url(&self, id: &Uuid) -> Result<String, AppError> {
        let doc = self.load(id).await?;
        let path = doc
            .storage_path
            .ok_or_else(|| AppError::BadRequest(format!("document {} has no uploaded file", id)))?;
        self.client
            .storage()
            .signed_url(DOCUMENTS_BUCKET, &path, self.client.signed_url_ttl())
            .await
    }

    /// Remove the document; its stored file is removed best-effort.
    pub async fn delete(&self, id: &Uuid) -> Result<Document, AppError> {
        let doc: Document = delete_by_id(self.client, DOCUMENTS, "document", id).await?;
        self.invalidate();
        if let Some(path) = &doc.storage_path {
            if let Err(e) = self.client.storage().remove(DOCUMENTS_BUCKET, std::slice::from_ref(path)).await {
                tracing::warn!(document_id = %id, error = %e, "document object left behind");
            }
        }
        Ok(doc)
    }
}
