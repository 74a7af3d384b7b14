use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{
    auth::Caller,
    extract::{Json as JsonBody, JsonOrDefault, Path},
    projection::{project, project_or_unknown, SessionView},
    AppState,
};
use crate::{
    entity::{session, user::Role},
    error::{BookingError, Result},
    ledger::NewBooking,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingBody {
    pub mentor_id: Option<String>,
    pub start_time: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityBody {
    pub availability: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub message: &'static str,
    pub session: SessionView,
    pub meeting_created: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub session: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub message: &'static str,
    pub availability: Vec<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsResponse {
    pub mentor_id: Uuid,
    pub slots: Vec<DateTime<Utc>>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Projects a session that is already committed, so a failed party lookup
/// must not turn the response into an error.
async fn view(state: &AppState, session: &session::Model) -> SessionView {
    let users = state
        .directory
        .find_many([session.mentee_id, session.mentor_id])
        .await;
    project_or_unknown(session, users)
}

/// POST /bookings
pub async fn create_booking(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<CreateBookingBody>,
) -> Result<(StatusCode, Json<SessionView>)> {
    caller.require(Role::Mentee)?;

    let (Some(mentor_id), Some(start_time), Some(topic)) = (
        non_blank(body.mentor_id),
        non_blank(body.start_time),
        non_blank(body.topic),
    ) else {
        return Err(BookingError::validation(
            "Missing required fields: mentorId, startTime, or topic",
        ));
    };

    let mentor_id = Uuid::parse_str(mentor_id.trim())
        .map_err(|_| BookingError::validation("Invalid mentorId"))?;
    let start_time = DateTime::parse_from_rfc3339(start_time.trim())
        .map_err(|_| BookingError::validation("Invalid date format for startTime"))?
        .with_timezone(&Utc);

    debug!(mentee_id = %caller.user_id, %mentor_id, %start_time, "booking request received");

    let session = state
        .ledger
        .create_session(NewBooking {
            mentee_id: caller.user_id,
            mentor_id,
            start_time,
            topic,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(view(&state, &session).await)))
}

/// GET /bookings/my
pub async fn my_bookings(State(state): State<AppState>, caller: Caller) -> Result<Json<Vec<SessionView>>> {
    let sessions = state.ledger.list_for_user(caller.user_id).await?;
    let users = state
        .directory
        .find_many(sessions.iter().flat_map(|s| [s.mentee_id, s.mentor_id]))
        .await?;
    Ok(Json(sessions.iter().map(|s| project(s, &users)).collect()))
}

/// POST /bookings/{id}/confirm
pub async fn confirm_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ConfirmResponse>> {
    caller.require(Role::Mentor)?;
    let confirmation = state.ledger.confirm(session_id, caller.user_id).await?;
    Ok(Json(ConfirmResponse {
        message: "Session confirmed successfully",
        session: view(&state, &confirmation.session).await,
        meeting_created: confirmation.meeting_created,
    }))
}

/// POST /bookings/{id}/reject
pub async fn reject_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<Uuid>,
    JsonOrDefault(body): JsonOrDefault<RejectBody>,
) -> Result<Json<SessionResponse>> {
    caller.require(Role::Mentor)?;
    let reason = non_blank(body.reason).ok_or_else(|| BookingError::validation("Rejection reason is required"))?;
    let session = state
        .ledger
        .reject(session_id, caller.user_id, Some(&reason))
        .await?;
    Ok(Json(SessionResponse {
        message: "Session rejected",
        session: view(&state, &session).await,
        warning: None,
    }))
}

/// POST /bookings/{id}/complete
pub async fn complete_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    state.ledger.complete(session_id, caller.user_id).await?;
    Ok(Json(MessageResponse {
        message: "Session marked as completed",
    }))
}

/// DELETE /bookings/{id}/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let cancellation = state.ledger.cancel(session_id, caller.user_id).await?;
    Ok(Json(SessionResponse {
        message: "Session cancelled successfully",
        session: view(&state, &cancellation.session).await,
        warning: cancellation.warning,
    }))
}

/// PUT /mentors/availability
pub async fn update_availability(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<AvailabilityBody>,
) -> Result<Json<AvailabilityResponse>> {
    caller.require(Role::Mentor)?;
    let mentor = state
        .directory
        .find(caller.user_id)
        .await?
        .ok_or(BookingError::Forbidden)?;

    // Unparseable entries are dropped, like past ones.
    let requested: Vec<DateTime<Utc>> = body
        .availability
        .iter()
        .filter_map(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|instant| instant.with_timezone(&Utc))
        .collect();

    let availability = state
        .availability
        .replace(&mentor, &requested, Utc::now())
        .await?;

    Ok(Json(AvailabilityResponse {
        message: "Availability updated successfully",
        availability,
    }))
}

/// GET /mentors/{id}/slots
pub async fn mentor_slots(
    State(state): State<AppState>,
    _caller: Caller,
    Path(mentor_id): Path<Uuid>,
) -> Result<Json<SlotsResponse>> {
    let mentor = state
        .directory
        .find(mentor_id)
        .await?
        .filter(|m| m.is_bookable_mentor())
        .ok_or(BookingError::MentorNotFound(mentor_id))?;

    let slots = state
        .availability
        .open_slots(mentor.id, &state.ledger, Utc::now())
        .await?;

    Ok(Json(SlotsResponse {
        mentor_id: mentor.id,
        slots,
    }))
}
