use super::{fetch_by_id, fetch_list, insert_row, optional_text, require_text, update_by_id, validate_email};
use crate::backend::{from_rows, to_row, Query, Row};
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{NewUser, Role, User, UserPatch};
use crate::query_key;
use crate::schema::USERS;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserFilter {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub include_inactive: bool,
}

pub struct UsersService<'a> {
    client: &'a CareClient,
}

impl<'a> UsersService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        UsersService { client }
    }

    /// Profiles are also embedded in the parent and co-teacher lists, and a role change can
    /// move a teacher in or out of classroom listings.
    fn invalidate(&self) {
        self.client.cache().invalidate_all(&[
            query_key!("users"),
            query_key!("user"),
            query_key!("child-parents"),
            query_key!("classroom-teachers"),
            query_key!("teacher-classrooms"),
        ]);
    }

    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        let mut q = Query::table(USERS).eq_opt("role", filter.role.map(|r| r.as_str()));
        if !filter.include_inactive {
            q = q.eq("is_active", true);
        }
        let key = query_key!("users", filter.role, filter.include_inactive);
        fetch_list(self.client, key, q.order("full_name", true)).await
    }

    pub async fn teachers(&self) -> Result<Vec<User>, AppError> {
        self.list(&UserFilter {
            role: Some(Role::Teacher),
            include_inactive: false,
        })
        .await
    }

    pub async fn parents(&self) -> Result<Vec<User>, AppError> {
        self.list(&UserFilter {
            role: Some(Role::Parent),
            include_inactive: false,
        })
        .await
    }

    pub async fn get(&self, id: &Uuid) -> Result<User, AppError> {
        fetch_by_id(self.client, query_key!("user", id), USERS, "user", id).await
    }

    /// Case-insensitive lookup; uncached.
    pub async fn by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = validate_email(email)?;
        let rows = self
            .client
            .backend()
            .select(&Query::table(USERS).eq("email", email).limit(1))
            .await?;
        Ok(from_rows::<User>(rows)?.into_iter().next())
    }

    /// Profile row without credentials. Emails are unique.
    pub async fn create_profile(&self, input: &NewUser) -> Result<User, AppError> {
        let mut input = input.clone();
        input.email = validate_email(&input.email)?;
        input.full_name = require_text("full_name", &input.full_name)?;
        let mut row = to_row(&input)?;
        row.insert("is_active".into(), Value::Bool(true));
        let user: User = insert_row(self.client, USERS, row).await?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "user profile created");
        self.invalidate();
        Ok(user)
    }

    pub async fn update(&self, id: &Uuid, patch: &UserPatch) -> Result<User, AppError> {
        let mut patch = patch.clone();
        patch.full_name = optional_text("full_name", patch.full_name.as_deref())?;
        let user = update_by_id(self.client, USERS, "user", id, to_row(&patch)?).await?;
        self.invalidate();
        Ok(user)
    }

    pub async fn set_role(&self, id: &Uuid, role: Role) -> Result<User, AppError> {
        let mut patch = Row::new();
        patch.insert("role".into(), Value::String(role.as_str().into()));
        let user = update_by_id(self.client, USERS, "user", id, patch).await?;
        tracing::info!(user_id = %id, role = role.as_str(), "user role changed");
        self.invalidate();
        Ok(user)
    }

    pub async fn deactivate(&self, id: &Uuid) -> Result<User, AppError> {
        self.set_active(id, false).await
    }

    pub async fn activate(&self, id: &Uuid) -> Result<User, AppError> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: &Uuid, active: bool) -> Result<User, AppError> {
        let mut patch = Row::new();
        patch.insert("is_active".into(), Value::Bool(active));
        let user = update_by_id(self.client, USERS, "user", id, patch).await?;
        self.invalidate();
        Ok(user)
    }
}
