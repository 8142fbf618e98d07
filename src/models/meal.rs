use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    MorningSnack,
    Lunch,
    AfternoonSnack,
    Dinner,
}

impl MealType {
    pub fn label(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::MorningSnack => "Morning snack",
            MealType::Lunch => "Lunch",
            MealType::AfternoonSnack => "Afternoon snack",
            MealType::Dinner => "Dinner",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortionConsumed {
    All,
    Most,
    Some,
    Little,
    None,
}

impl PortionConsumed {
    pub fn label(&self) -> &'static str {
        match self {
            PortionConsumed::All => "Ate all",
            PortionConsumed::Most => "Ate most",
            PortionConsumed::Some => "Ate some",
            PortionConsumed::Little => "Ate a little",
            PortionConsumed::None => "Didn't eat",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MealLog {
    pub id: Uuid,
    pub child_id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    #[serde(default)]
    pub food_items: Vec<String>,
    pub portion_consumed: PortionConsumed,
    pub notes: Option<String>,
    pub logged_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MealLog {
    /// One-line summary: "Lunch: pasta, peas (Ate most)".
    pub fn summary(&self) -> String {
        let items = if self.food_items.is_empty() {
            "no items recorded".to_string()
        } else {
            self.food_items.join(", ")
        };
        format!("{}: {} ({})", self.meal_type.label(), items, self.portion_consumed.label())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewMealLog {
    pub child_id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    #[serde(default)]
    pub food_items: Vec<String>,
    pub portion_consumed: PortionConsumed,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub logged_by: Option<Uuid>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MealLogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_items: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portion_consumed: Option<PortionConsumed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portion_wire_names_and_labels() {
        let p: PortionConsumed = serde_json::from_str("\"most\"").unwrap();
        assert_eq!(p, PortionConsumed::Most);
        assert_eq!(p.label(), "Ate most");
        assert_eq!(serde_json::to_string(&PortionConsumed::Little).unwrap(), "\"little\"");
        assert_eq!(serde_json::to_string(&MealType::AfternoonSnack).unwrap(), "\"afternoon_snack\"");
    }
}
