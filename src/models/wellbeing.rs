use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Injury,
    Illness,
    Behavior,
    Medication,
    Other,
}

impl IncidentType {
    pub fn label(&self) -> &'static str {
        match self {
            IncidentType::Injury => "Injury",
            IncidentType::Illness => "Illness",
            IncidentType::Behavior => "Behaviour",
            IncidentType::Medication => "Medication",
            IncidentType::Other => "Other",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "Minor",
            Severity::Medium => "Moderate",
            Severity::High => "Serious",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WellbeingReport {
    pub id: Uuid,
    pub child_id: Uuid,
    pub report_date: NaiveDate,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub description: String,
    pub action_taken: Option<String>,
    pub parent_notified: bool,
    pub parent_notified_at: Option<DateTime<Utc>>,
    pub reported_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewWellbeingReport {
    pub child_id: Uuid,
    pub report_date: NaiveDate,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub action_taken: Option<String>,
    #[serde(default)]
    pub reported_by: Option<Uuid>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WellbeingReportPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<IncidentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<String>,
}
