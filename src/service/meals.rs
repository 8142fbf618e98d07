use super::{clean_items, delete_by_id, fetch_list, insert_row, update_by_id, validate_date_range};
use crate::backend::{to_row, Query};
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{MealLog, MealLogPatch, NewMealLog};
use crate::query_key;
use crate::schema::MEAL_LOGS;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MealFilter {
    #[serde(default)]
    pub child_id: Option<Uuid>,
    /// Exact day; takes precedence over `from`/`to`.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

pub struct MealsService<'a> {
    client: &'a CareClient,
}

impl<'a> MealsService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        MealsService { client }
    }

    /// Newest day first; within a day, newest entry first.
    pub async fn list(&self, filter: &MealFilter) -> Result<Vec<MealLog>, AppError> {
        validate_date_range(filter.from, filter.to)?;
        let key = query_key!("meals", filter.child_id, filter.date, filter.from, filter.to);
        let mut q = Query::table(MEAL_LOGS).eq_opt("child_id", filter.child_id.map(|id| id.to_string()));
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

    pub async fn create(&self, input: &NewMealLog) -> Result<MealLog, AppError> {
        let mut input = input.clone();
        input.food_items = clean_items(&input.food_items);
        let meal: MealLog = insert_row(self.client, MEAL_LOGS, to_row(&input)?).await?;
        tracing::info!(meal_id = %meal.id, child_id = %meal.child_id, "meal logged");
        self.client.cache().invalidate(&query_key!("meals"));
        Ok(meal)
    }

    pub async fn update(&self, id: &Uuid, patch: &MealLogPatch) -> Result<MealLog, AppError> {
        let mut patch = patch.clone();
        patch.food_items = patch.food_items.as_deref().map(clean_items);
        let meal = update_by_id(self.client, MEAL_LOGS, "meal log", id, to_row(&patch)?).await?;
        self.client.cache().invalidate(&query_key!("meals"));
        Ok(meal)
    }

    pub async fn delete(&self, id: &Uuid) -> Result<MealLog, AppError> {
        let meal = delete_by_id(self.client, MEAL_LOGS, "meal log", id).await?;
        self.client.cache().invalidate(&query_key!("meals"));
        Ok(meal)
    }
}
