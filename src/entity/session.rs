//! Session entity model for Sea-ORM database interaction.
//!
//! A session is a single mentee–mentor booking and its lifecycle state. This
//! module defines the database schema representation that maps to the
//! "sessions" table, plus the [`SessionStatus`] state machine.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a booking.
///
/// ```text
/// pending ──► confirmed ──► completed
///    │            │
///    ├──► rejected└──► cancelled
///    └──────────────► cancelled
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl SessionStatus {
    /// Statuses that hold a mentor's time slot.
    pub const ACTIVE: [SessionStatus; 2] = [SessionStatus::Pending, SessionStatus::Confirmed];

    /// Whether a session in this status still occupies the mentor's calendar.
    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    /// No edge leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Cancelled | SessionStatus::Rejected
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sea-ORM entity model representing a booked session.
///
/// # Database Schema
///
/// | Column             | Type              | Description                                  |
/// |--------------------|-------------------|----------------------------------------------|
/// | id                 | UUID (Primary Key)| Session ID                                   |
/// | mentee_id          | UUID              | Booking mentee                               |
/// | mentor_id          | UUID              | Booked mentor                                |
/// | start_time         | TIMESTAMPTZ       | Inclusive start of the slot                  |
/// | end_time           | TIMESTAMPTZ       | Exclusive end, always start + 60 minutes     |
/// | topic              | TEXT              | What the mentee wants to discuss             |
/// | status             | VARCHAR(16)       | One of [`SessionStatus`]                     |
/// | rejection_reason   | TEXT NULL         | Set only when rejected                       |
/// | meeting_link       | TEXT NULL         | Set only when confirmed or completed         |
/// | meeting_id         | TEXT NULL         | Provider meeting identifier                  |
/// | meeting_password   | TEXT NULL         | Meeting passcode                             |
/// | reviewed_by_mentee | BOOLEAN           | Mentee submitted a review                    |
/// | reviewed_by_mentor | BOOLEAN           | Mentor submitted a review                    |
/// | created_at         | TIMESTAMPTZ       | Creation instant                             |
/// | updated_at         | TIMESTAMPTZ       | Last mutation instant                        |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub mentee_id: Uuid,
    pub mentor_id: Uuid,
    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,
    #[sea_orm(column_type = "Text")]
    pub topic: String,
    pub status: SessionStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub meeting_link: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub meeting_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub meeting_password: Option<String>,
    pub reviewed_by_mentee: bool,
    pub reviewed_by_mentor: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Whether `user_id` is the mentee or the mentor of this session.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.mentee_id == user_id || self.mentor_id == user_id
    }

    /// The party on the other side of `user_id`.
    pub fn counterpart_of(&self, user_id: Uuid) -> Uuid {
        if user_id == self.mentee_id {
            self.mentor_id
        } else {
            self.mentee_id
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::MenteeId",
        to = "super::user::Column::Id"
    )]
    Mentee,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::MentorId",
        to = "super::user::Column::Id"
    )]
    Mentor,
}

impl ActiveModelBehavior for ActiveModel {}
