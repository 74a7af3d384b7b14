//! Read-time projection of sessions for API responses.
//!
//! Counterpart display fields are attached here rather than stored on the
//! session, so they always reflect the current user records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    entity::{
        session::{self, SessionStatus},
        user,
    },
    error::Result,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub university: Option<String>,
}

impl PartyView {
    fn from_user(user: &user::Model) -> Self {
        Self {
            id: user.id,
            name: user.full_name.clone(),
            email: user.email.clone(),
            university: user.university.clone(),
        }
    }

    fn unknown(id: Uuid) -> Self {
        Self {
            id,
            name: "Unknown user".to_string(),
            email: String::new(),
            university: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub mentee: PartyView,
    pub mentor: PartyView,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub topic: String,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_password: Option<String>,
    pub reviewed_by_mentee: bool,
    pub reviewed_by_mentor: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Builds the client view of `session`, looking parties up in `users`.
pub fn project(session: &session::Model, users: &HashMap<Uuid, user::Model>) -> SessionView {
    let party = |id: Uuid| {
        users
            .get(&id)
            .map(PartyView::from_user)
            .unwrap_or_else(|| PartyView::unknown(id))
    };

    SessionView {
        id: session.id,
        mentee: party(session.mentee_id),
        mentor: party(session.mentor_id),
        start_time: session.start_time,
        end_time: session.end_time,
        topic: session.topic.clone(),
        status: session.status,
        rejection_reason: session.rejection_reason.clone(),
        meeting_link: session.meeting_link.clone(),
        meeting_id: session.meeting_id.clone(),
        meeting_password: session.meeting_password.clone(),
        reviewed_by_mentee: session.reviewed_by_mentee,
        reviewed_by_mentor: session.reviewed_by_mentor,
        created_at: session.created_at,
        updated_at: session.updated_at,
    }
}

/// Like [`project`], but a failed party lookup degrades to unknown parties.
pub fn project_or_unknown(session: &session::Model, users: Result<HashMap<Uuid, user::Model>>) -> SessionView {
    match users {
        Ok(users) => project(session, &users),
        Err(error) => {
            warn!(session_id = %session.id, %error, "party lookup failed, projecting without party details");
            project(session, &HashMap::new())
        }
    }
}
