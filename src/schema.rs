//! Table definitions: the column contract shared by DDL, the SQL builder and the row models.

/// One column: name, PostgreSQL type, and the DDL suffix (constraints, defaults).
#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub pg_type: &'static str,
    pub ddl: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    /// Extra table-level constraints (unique, check).
    pub constraints: &'static [&'static str],
    /// Row changes are published to realtime subscribers.
    pub realtime: bool,
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

const fn col(name: &'static str, pg_type: &'static str, ddl: &'static str) -> ColumnDef {
    ColumnDef { name, pg_type, ddl }
}

const ID: ColumnDef = col("id", "uuid", "PRIMARY KEY DEFAULT gen_random_uuid()");
const CREATED_AT: ColumnDef = col("created_at", "timestamptz", "NOT NULL DEFAULT NOW()");
const UPDATED_AT: ColumnDef = col("updated_at", "timestamptz", "NOT NULL DEFAULT NOW()");

pub const USERS: &str = "users";
pub const CHILDREN: &str = "children";
pub const CHILD_PARENTS: &str = "child_parents";
pub const CLASSROOMS: &str = "classrooms";
pub const TEACHER_CLASSROOMS: &str = "teacher_classrooms";
pub const ACTIVITY_LOGS: &str = "activity_logs";
pub const ACTIVITY_PHOTOS: &str = "activity_photos";
pub const MEAL_LOGS: &str = "meal_logs";
pub const MESSAGES: &str = "messages";
pub const ANNOUNCEMENTS: &str = "announcements";
pub const WELLBEING_REPORTS: &str = "wellbeing_reports";
pub const DOCUMENTS: &str = "documents";
pub const NOTIFICATIONS: &str = "notifications";
pub const SCHOOL_SETTINGS: &str = "school_settings";
pub const AUTH_CREDENTIALS: &str = "auth_credentials";
pub const AUTH_SESSIONS: &str = "auth_sessions";
pub const PASSWORD_RESETS: &str = "password_resets";

/// All tables in dependency order (referenced tables first).
pub const TABLES: &[TableDef] = &[
    TableDef {
        name: USERS,
        columns: &[
            ID,
            col("email", "text", "NOT NULL UNIQUE"),
            col("full_name", "text", "NOT NULL"),
            col("role", "text", "NOT NULL CHECK (role IN ('admin', 'teacher', 'parent'))"),
            col("phone", "text", ""),
            col("avatar_url", "text", ""),
            col("is_active", "boolean", "NOT NULL DEFAULT TRUE"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: CLASSROOMS,
        columns: &[
            ID,
            col("name", "text", "NOT NULL"),
            col("teacher_id", "uuid", "REFERENCES users(id) ON DELETE SET NULL"),
            col("capacity", "integer", ""),
            col("age_group", "text", ""),
            col("is_active", "boolean", "NOT NULL DEFAULT TRUE"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: TEACHER_CLASSROOMS,
        columns: &[
            ID,
            col("teacher_id", "uuid", "NOT NULL REFERENCES users(id) ON DELETE CASCADE"),
            col("classroom_id", "uuid", "NOT NULL REFERENCES classrooms(id) ON DELETE CASCADE"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &["UNIQUE (teacher_id, classroom_id)"],
        realtime: false,
    },
    TableDef {
        name: CHILDREN,
        columns: &[
            ID,
            col("first_name", "text", "NOT NULL"),
            col("last_name", "text", "NOT NULL"),
            col("date_of_birth", "date", ""),
            col("classroom_id", "uuid", "REFERENCES classrooms(id) ON DELETE SET NULL"),
            col("allergies", "text", ""),
            col("medical_notes", "text", ""),
            col("emergency_contact", "text", ""),
            col("is_active", "boolean", "NOT NULL DEFAULT TRUE"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: CHILD_PARENTS,
        columns: &[
            ID,
            col("child_id", "uuid", "NOT NULL REFERENCES children(id) ON DELETE CASCADE"),
            col("parent_id", "uuid", "NOT NULL REFERENCES users(id) ON DELETE CASCADE"),
            col("relationship", "text", ""),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &["UNIQUE (child_id, parent_id)"],
        realtime: false,
    },
    TableDef {
        name: ACTIVITY_LOGS,
        columns: &[
            ID,
            col("child_id", "uuid", "NOT NULL REFERENCES children(id) ON DELETE CASCADE"),
            col("date", "date", "NOT NULL"),
            col("arrival_time", "time", ""),
            col("pickup_time", "time", ""),
            col("mood", "text", "CHECK (mood IN ('happy', 'calm', 'tired', 'fussy', 'sad', 'sick'))"),
            col("nap_start", "time", ""),
            col("nap_end", "time", ""),
            col("activities", "text", ""),
            col("notes", "text", ""),
            col("logged_by", "uuid", "REFERENCES users(id) ON DELETE SET NULL"),
            col("acknowledged", "boolean", "NOT NULL DEFAULT FALSE"),
            col("acknowledged_at", "timestamptz", ""),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: ACTIVITY_PHOTOS,
        columns: &[
            ID,
            col("activity_id", "uuid", "NOT NULL REFERENCES activity_logs(id) ON DELETE CASCADE"),
            col("url", "text", "NOT NULL"),
            col("storage_path", "text", "NOT NULL"),
            col("caption", "text", ""),
            col("uploaded_by", "uuid", "REFERENCES users(id) ON DELETE SET NULL"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: MEAL_LOGS,
        columns: &[
            ID,
            col("child_id", "uuid", "NOT NULL REFERENCES children(id) ON DELETE CASCADE"),
            col("date", "date", "NOT NULL"),
            col(
                "meal_type",
                "text",
                "NOT NULL CHECK (meal_type IN ('breakfast', 'morning_snack', 'lunch', 'afternoon_snack', 'dinner'))",
            ),
            col("food_items", "jsonb", "NOT NULL DEFAULT '[]'::jsonb"),
            col(
                "portion_consumed",
                "text",
                "NOT NULL CHECK (portion_consumed IN ('all', 'most', 'some', 'little', 'none'))",
            ),
            col("notes", "text", ""),
            col("logged_by", "uuid", "REFERENCES users(id) ON DELETE SET NULL"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: MESSAGES,
        columns: &[
            ID,
            col("sender_id", "uuid", "NOT NULL REFERENCES users(id) ON DELETE CASCADE"),
            col("recipient_id", "uuid", "NOT NULL REFERENCES users(id) ON DELETE CASCADE"),
            col("child_id", "uuid", "REFERENCES children(id) ON DELETE SET NULL"),
            col("content", "text", "NOT NULL"),
            col("is_read", "boolean", "NOT NULL DEFAULT FALSE"),
            col("read_at", "timestamptz", ""),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: true,
    },
    TableDef {
        name: ANNOUNCEMENTS,
        columns: &[
            ID,
            col("title", "text", "NOT NULL"),
            col("content", "text", "NOT NULL"),
            col("priority", "text", "NOT NULL CHECK (priority IN ('low', 'normal', 'high', 'urgent'))"),
            col("is_pinned", "boolean", "NOT NULL DEFAULT FALSE"),
            col("event_date", "date", ""),
            col("classroom_id", "uuid", "REFERENCES classrooms(id) ON DELETE CASCADE"),
            col("author_id", "uuid", "REFERENCES users(id) ON DELETE SET NULL"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: WELLBEING_REPORTS,
        columns: &[
            ID,
            col("child_id", "uuid", "NOT NULL REFERENCES children(id) ON DELETE CASCADE"),
            col("report_date", "date", "NOT NULL"),
            col(
                "incident_type",
                "text",
                "NOT NULL CHECK (incident_type IN ('injury', 'illness', 'behavior', 'medication', 'other'))",
            ),
            col("severity", "text", "NOT NULL CHECK (severity IN ('low', 'medium', 'high'))"),
            col("description", "text", "NOT NULL"),
            col("action_taken", "text", ""),
            col("parent_notified", "boolean", "NOT NULL DEFAULT FALSE"),
            col("parent_notified_at", "timestamptz", ""),
            col("reported_by", "uuid", "REFERENCES users(id) ON DELETE SET NULL"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: DOCUMENTS,
        columns: &[
            ID,
            col("child_id", "uuid", "NOT NULL REFERENCES children(id) ON DELETE CASCADE"),
            col("title", "text", "NOT NULL"),
            col("document_type", "text", "NOT NULL"),
            col("due_date", "date", ""),
            col(
                "status",
                "text",
                "NOT NULL CHECK (status IN ('pending', 'submitted', 'approved', 'rejected', 'expired'))",
            ),
            col("file_url", "text", ""),
            col("storage_path", "text", ""),
            col("submitted_at", "timestamptz", ""),
            col("reviewed_by", "uuid", "REFERENCES users(id) ON DELETE SET NULL"),
            col("notes", "text", ""),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: NOTIFICATIONS,
        columns: &[
            ID,
            col("user_id", "uuid", "NOT NULL REFERENCES users(id) ON DELETE CASCADE"),
            col(
                "notification_type",
                "text",
                "NOT NULL CHECK (notification_type IN ('message', 'announcement', 'activity', 'meal', 'wellbeing', 'document', 'system'))",
            ),
            col("title", "text", "NOT NULL"),
            col("message", "text", "NOT NULL"),
            col("is_read", "boolean", "NOT NULL DEFAULT FALSE"),
            col("link", "text", ""),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: true,
    },
    TableDef {
        name: SCHOOL_SETTINGS,
        columns: &[
            ID,
            col("school_name", "text", "NOT NULL"),
            col("address", "text", ""),
            col("phone", "text", ""),
            col("email", "text", ""),
            col("opening_time", "time", ""),
            col("closing_time", "time", ""),
            col("timezone", "text", "NOT NULL DEFAULT 'UTC'"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: AUTH_CREDENTIALS,
        columns: &[
            ID,
            col("user_id", "uuid", "NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE"),
            col("email", "text", "NOT NULL UNIQUE"),
            col("password_hash", "text", "NOT NULL"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: AUTH_SESSIONS,
        columns: &[
            ID,
            col("token", "text", "NOT NULL UNIQUE"),
            col("user_id", "uuid", "NOT NULL REFERENCES users(id) ON DELETE CASCADE"),
            col("expires_at", "timestamptz", "NOT NULL"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
    TableDef {
        name: PASSWORD_RESETS,
        columns: &[
            ID,
            col("token", "text", "NOT NULL UNIQUE"),
            col("user_id", "uuid", "NOT NULL REFERENCES users(id) ON DELETE CASCADE"),
            col("expires_at", "timestamptz", "NOT NULL"),
            col("used", "boolean", "NOT NULL DEFAULT FALSE"),
            CREATED_AT,
            UPDATED_AT,
        ],
        constraints: &[],
        realtime: false,
    },
];

pub fn table(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_has_audit_columns() {
        for t in TABLES {
            for c in ["id", "created_at", "updated_at"] {
                assert!(t.column(c).is_some(), "{} lacks {}", t.name, c);
            }
        }
    }

    #[test]
    fn referenced_tables_come_first() {
        for (i, t) in TABLES.iter().enumerate() {
            for c in t.columns {
                if let Some(rest) = c.ddl.split("REFERENCES ").nth(1) {
                    let target = rest.split('(').next().unwrap_or_default();
                    let pos = TABLES.iter().position(|o| o.name == target);
                    assert!(matches!(pos, Some(p) if p <= i), "{}.{} references {}", t.name, c.name, target);
                }
            }
        }
    }
}
