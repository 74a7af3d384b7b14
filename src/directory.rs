//! Read access to user records.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    entity::user::{self, Entity as UserEntity, Role},
    error::Result,
    notify::{AdminRecipients, NotifyError},
};

/// Fields for registering a user. Registration itself belongs to the
/// authentication subsystem; this exists for seeding and tests.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub university: Option<String>,
    pub role: Role,
    pub is_approved: bool,
}

#[derive(Debug, Clone)]
pub struct UserDirectory {
    conn: DatabaseConnection,
}

impl UserDirectory {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<user::Model>> {
        Ok(UserEntity::find_by_id(id).one(&self.conn).await?)
    }

    /// Loads several users at once, keyed by id. Unknown ids are skipped.
    pub async fn find_many(&self, ids: impl IntoIterator<Item = Uuid>) -> Result<HashMap<Uuid, user::Model>> {
        let mut ids: Vec<Uuid> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = UserEntity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&self.conn)
            .await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    pub async fn register(&self, new_user: NewUser) -> Result<user::Model> {
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(new_user.email),
            full_name: Set(new_user.full_name),
            university: Set(new_user.university),
            role: Set(new_user.role),
            is_approved: Set(new_user.is_approved),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        };
        Ok(model.insert(&self.conn).await?)
    }

    /// Flips a user's active flag.
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        let model = user::ActiveModel {
            id: Set(id),
            is_active: Set(active),
            ..Default::default()
        };
        model.update(&self.conn).await?;
        Ok(())
    }
}

#[async_trait]
impl AdminRecipients for UserDirectory {
    async fn admin_emails(&self) -> Result<Vec<String>, NotifyError> {
        let admins = UserEntity::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .filter(user::Column::IsActive.eq(true))
            .all(&self.conn)
            .await
            .map_err(|e| NotifyError::Recipients(e.to_string()))?;
        Ok(admins.into_iter().map(|a| a.email).collect())
    }
}
