//! User entity model.
//!
//! Users are owned by the authentication and profile subsystems; the booking
//! ledger only reads them to vet mentors and to address notifications.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "mentee")]
    Mentee,
    #[sea_orm(string_value = "mentor")]
    Mentor,
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// Sea-ORM entity model representing a platform user.
///
/// | Column      | Type               | Description                          |
/// |-------------|--------------------|--------------------------------------|
/// | id          | UUID (Primary Key) | User ID                              |
/// | email       | TEXT (unique)      | Notification address                 |
/// | full_name   | TEXT               | Display name                         |
/// | university  | TEXT NULL          | Student mentor's university          |
/// | role        | VARCHAR(16)        | One of [`Role`]                      |
/// | is_approved | BOOLEAN            | Mentor passed verification           |
/// | is_active   | BOOLEAN            | Account enabled                      |
/// | created_at  | TIMESTAMPTZ        | Registration instant                 |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text", unique)]
    pub email: String,
    #[sea_orm(column_type = "Text")]
    pub full_name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub university: Option<String>,
    pub role: Role,
    pub is_approved: bool,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

impl Model {
    /// A mentor that may currently receive bookings.
    pub fn is_bookable_mentor(&self) -> bool {
        self.role == Role::Mentor && self.is_approved && self.is_active
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::availability_slot::Entity")]
    AvailabilitySlot,
}

impl Related<super::availability_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AvailabilitySlot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
