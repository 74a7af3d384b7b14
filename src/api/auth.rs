//! Authenticated caller context.
//!
//! Authentication happens elsewhere; once it succeeds the caller identity is
//! stored in the request's `tower-sessions` session under [`CALLER_KEY`]
//! via [`sign_in`]. Handlers receive it through the [`Caller`] extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    entity::user::Role,
    error::{BookingError, Result},
};

/// Session key holding the serialized [`Caller`].
pub const CALLER_KEY: &str = "caller";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    /// Fails with `Forbidden` unless the caller has `role`.
    pub fn require(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(BookingError::Forbidden)
        }
    }
}

/// Attaches an authenticated identity to the session.
pub async fn sign_in(session: &Session, caller: Caller) -> Result<()> {
    session.cycle_id().await?;
    session.insert(CALLER_KEY, caller).await?;
    Ok(())
}

/// Removes the identity and destroys the session.
pub async fn sign_out(session: &Session) -> Result<()> {
    session.flush().await?;
    Ok(())
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Installed by `SessionManagerLayer`.
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| BookingError::SessionStore("session layer is not installed".into()))?;
        session
            .get::<Caller>(CALLER_KEY)
            .await?
            .ok_or(BookingError::Unauthenticated)
    }
}
