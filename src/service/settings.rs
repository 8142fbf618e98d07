use super::{insert_row, optional_text, update_by_id};
use crate::backend::{from_rows, to_row, Query};
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{SchoolSettings, SchoolSettingsPatch};
use crate::query_key;
use crate::schema::SCHOOL_SETTINGS;

pub struct SettingsService<'a> {
    client: &'a CareClient,
}

impl<'a> SettingsService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        SettingsService { client }
    }

    /// The settings row, or `None` before the center has been configured.
    pub async fn get(&self) -> Result<Option<SchoolSettings>, AppError> {
        let client = self.client;
        client
            .cache()
            .fetch(query_key!("school-settings"), || async {
                let rows = client
                    .backend()
                    .select(&Query::table(SCHOOL_SETTINGS).order("created_at", true).limit(1))
                    .await?;
                Ok(from_rows::<SchoolSettings>(rows)?.into_iter().next())
            })
            .await
    }

    /// Patch the single settings row, creating it on first use.
    pub async fn update(&self, patch: &SchoolSettingsPatch) -> Result<SchoolSettings, AppError> {
        let mut patch = patch.clone();
        patch.school_name = optional_text("school_name", patch.school_name.as_deref())?;
        let existing = self
            .client
            .backend()
            .select(&Query::table(SCHOOL_SETTINGS).order("created_at", true).limit(1))
            .await?;
        let existing: Option<SchoolSettings> = from_rows(existing)?.into_iter().next();
        let settings: SchoolSettings = match existing {
            Some(s) => update_by_id(self.client, SCHOOL_SETTINGS, "school settings", &s.id, to_row(&patch)?).await?,
            None => {
                let row = to_row(&patch)?;
                if !row.contains_key("school_name") {
                    return Err(AppError::Validation("school_name is required".into()));
                }
                insert_row(self.client, SCHOOL_SETTINGS, row).await?
            }
        };
        tracing::info!(settings_id = %settings.id, "school settings saved");
        self.client.cache().invalidate(&query_key!("school-settings"));
        Ok(settings)
    }
}
