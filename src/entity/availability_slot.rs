//! Availability slot entity model.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A mentor-declared instant at which a one-hour session could begin.
///
/// | Column    | Type                | Description          |
/// |-----------|---------------------|----------------------|
/// | id        | INT (Primary Key)   | Row ID               |
/// | mentor_id | UUID                | Owning mentor        |
/// | starts_at | TIMESTAMPTZ         | Offered start instant|
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "availability_slots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub mentor_id: Uuid,
    pub starts_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::MentorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Mentor,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mentor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
