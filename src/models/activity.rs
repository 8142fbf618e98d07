use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Calm,
    Tired,
    Fussy,
    Sad,
    Sick,
}

impl Mood {
    pub fn label(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Calm => "Calm",
            Mood::Tired => "Tired",
            Mood::Fussy => "Fussy",
            Mood::Sad => "Sad",
            Mood::Sick => "Unwell",
        }
    }
}

/// One child's day: attendance times, mood, nap, free-text activities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub child_id: Uuid,
    pub date: NaiveDate,
    pub arrival_time: Option<NaiveTime>,
    pub pickup_time: Option<NaiveTime>,
    pub mood: Option<Mood>,
    pub nap_start: Option<NaiveTime>,
    pub nap_end: Option<NaiveTime>,
    pub activities: Option<String>,
    pub notes: Option<String>,
    pub logged_by: Option<Uuid>,
    /// Set once a parent has seen the log.
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivityLog {
    /// Nap length in minutes when both ends are recorded and ordered.
    pub fn nap_minutes(&self) -> Option<i64> {
        let (start, end) = (self.nap_start?, self.nap_end?);
        let mins = (end - start).num_minutes();
        (mins >= 0).then_some(mins)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewActivityLog {
    pub child_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub arrival_time: Option<NaiveTime>,
    #[serde(default)]
    pub pickup_time: Option<NaiveTime>,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub nap_start: Option<NaiveTime>,
    #[serde(default)]
    pub nap_end: Option<NaiveTime>,
    #[serde(default)]
    pub activities: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub logged_by: Option<Uuid>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActivityLogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nap_start: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nap_end: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityPhoto {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub url: String,
    pub storage_path: String,
    pub caption: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
