use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Message,
    Announcement,
    Activity,
    Meal,
    Wellbeing,
    Document,
    System,
}

impl NotificationType {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationType::Message => "New message",
            NotificationType::Announcement => "Announcement",
            NotificationType::Activity => "Daily activity",
            NotificationType::Meal => "Meal update",
            NotificationType::Wellbeing => "Wellbeing report",
            NotificationType::Document => "Document",
            NotificationType::System => "System",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    /// In-app route to open when the notification is clicked.
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// Bell badge text: nothing at zero, "9+" past nine.
pub fn badge_text(unread: u64) -> Option<String> {
    match unread {
        0 => None,
        1..=9 => Some(unread.to_string()),
        _ => Some("9+".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_caps_at_nine() {
        assert_eq!(badge_text(0), None);
        assert_eq!(badge_text(3).as_deref(), Some("3"));
        assert_eq!(badge_text(42).as_deref(), Some("9+"));
    }
}
