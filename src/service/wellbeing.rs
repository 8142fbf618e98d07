use super::{
    delete_by_id, fetch_by_id, fetch_list, insert_row, now_value, optional_text, require_text, update_by_id,
    validate_date_range,
};
use crate::backend::{to_row, Query, Row};
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{NewWellbeingReport, WellbeingReport, WellbeingReportPatch};
use crate::query_key;
use crate::schema::WELLBEING_REPORTS;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WellbeingFilter {
    #[serde(default)]
    pub child_id: Option<Uuid>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

pub struct WellbeingService<'a> {
    client: &'a CareClient,
}

impl<'a> WellbeingService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        WellbeingService { client }
    }

    fn invalidate(&self) {
        self.client.cache().invalidate(&query_key!("wellbeing-reports"));
    }

    pub async fn list(&self, filter: &WellbeingFilter) -> Result<Vec<WellbeingReport>, AppError> {
        validate_date_range(filter.from, filter.to)?;
        let mut q = Query::table(WELLBEING_REPORTS).eq_opt("child_id", filter.child_id.map(|id| id.to_string()));
        if let Some(f) = filter.from {
            q = q.gte("report_date", f.to_string());
        }
        if let Some(t) = filter.to {
            q = q.lte("report_date", t.to_string());
        }
        let key = query_key!("wellbeing-reports", filter.child_id, filter.from, filter.to);
        fetch_list(self.client, key, q.order("report_date", false).order("created_at", false)).await
    }

    pub async fn get(&self, id: &Uuid) -> Result<WellbeingReport, AppError> {
        let key = query_key!("wellbeing-reports", "by-id", id);
        fetch_by_id(self.client, key, WELLBEING_REPORTS, "wellbeing report", id).await
    }

    pub async fn create(&self, input: &NewWellbeingReport) -> Result<WellbeingReport, AppError> {
        let mut input = input.clone();
        input.description = require_text("description", &input.description)?;
        let r: WellbeingReport = insert_row(self.client, WELLBEING_REPORTS, to_row(&input)?).await?;
        tracing::info!(report_id = %r.id, child_id = %r.child_id, severity = ?r.severity, "wellbeing report filed");
        self.invalidate();
        Ok(r)
    }

    pub async fn update(&self, id: &Uuid, patch: &WellbeingReportPatch) -> Result<WellbeingReport, AppError> {
        let mut patch = patch.clone();
        patch.description = optional_text("description", patch.description.as_deref())?;
        let r = update_by_id(self.client, WELLBEING_REPORTS, "wellbeing report", id, to_row(&patch)?).await?;
        self.invalidate();
        Ok(r)
    }

    pub async fn mark_parent_notified(&self, id: &Uuid) -> Result<WellbeingReport, AppError> {
        let mut patch = Row::new();
        patch.insert("parent_notified".into(), Value::Bool(true));
        patch.insert("parent_notified_at".into(), now_value());
        let r = update_by_id(self.client, WELLBEING_REPORTS, "wellbeing report", id, patch).await?;
        self.invalidate();
        Ok(r)
    }

    pub async fn delete(&self, id: &Uuid) -> Result<WellbeingReport, AppError> {
        let r = delete_by_id(self.client, WELLBEING_REPORTS, "wellbeing report", id).await?;
        self.invalidate();
        Ok(r)
    }
}
