use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    directory::UserDirectory,
    entity::{
        session::{self, ActiveModel as SessionActiveModel, Entity as SessionEntity, SessionStatus},
        user,
    },
    error::{BookingError, Result},
    meeting::{MeetingContext, MeetingRelease, Provisioner},
    notify::Notifier,
    schedule::{find_conflict, Booked, Interval},
};

/// Stored when a mentor rejects without giving a reason.
pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

/// A booking request as accepted by [`SessionLedger::create_session`].
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub mentee_id: Uuid,
    pub mentor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub topic: String,
}

/// A state-machine edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Confirm,
    Reject,
    Complete,
    Cancel,
}

impl Transition {
    pub fn verb(self) -> &'static str {
        match self {
            Transition::Confirm => "confirm",
            Transition::Reject => "reject",
            Transition::Complete => "complete",
            Transition::Cancel => "cancel",
        }
    }

    /// Statuses this edge may leave from.
    pub fn sources(self) -> &'static [SessionStatus] {
        match self {
            Transition::Confirm | Transition::Reject => &[SessionStatus::Pending],
            Transition::Complete => &[SessionStatus::Confirmed],
            Transition::Cancel => &[SessionStatus::Pending, SessionStatus::Confirmed],
        }
    }

    pub fn target(self) -> SessionStatus {
        match self {
            Transition::Confirm => SessionStatus::Confirmed,
            Transition::Reject => SessionStatus::Rejected,
            Transition::Complete => SessionStatus::Completed,
            Transition::Cancel => SessionStatus::Cancelled,
        }
    }

    /// Confirm and reject belong to the owning mentor; complete and cancel to
    /// either party.
    pub fn permits(self, session: &session::Model, actor: Uuid) -> bool {
        match self {
            Transition::Confirm | Transition::Reject => session.mentor_id == actor,
            Transition::Complete | Transition::Cancel => session.involves(actor),
        }
    }
}

/// Result of a successful confirmation.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub session: session::Model,
    /// `false` when the meeting is a synthesized fallback.
    pub meeting_created: bool,
}

/// Result of a successful cancellation.
#[derive(Debug, Clone)]
pub struct Cancellation {
    pub session: session::Model,
    /// Set when a provisioned meeting could not be removed.
    pub warning: Option<String>,
}

/// Per-mentor async locks serializing conflict check and insert.
#[derive(Debug, Default, Clone)]
struct MentorLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl MentorLocks {
    async fn acquire(&self, mentor_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            // Entries nobody holds or waits on can go.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(mentor_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// The booking ledger: creates sessions and drives their lifecycle.
///
/// Conflict detection for a mentor runs under that mentor's lock and inside
/// a database transaction, so two concurrent requests for overlapping slots
/// cannot both be admitted. Status changes are conditional updates on the
/// observed status. Meeting-provider and notification calls never run under
/// a lock and never fail an operation.
#[derive(Clone)]
pub struct SessionLedger {
    conn: DatabaseConnection,
    directory: UserDirectory,
    provisioner: Provisioner,
    notifier: Notifier,
    locks: MentorLocks,
}

impl SessionLedger {
    pub fn new(conn: DatabaseConnection, provisioner: Provisioner, notifier: Notifier) -> Self {
        Self {
            directory: UserDirectory::new(conn.clone()),
            conn,
            provisioner,
            notifier,
            locks: MentorLocks::default(),
        }
    }

    /// Books a one-hour slot with a mentor. The session starts out pending.
    pub async fn create_session(&self, booking: NewBooking) -> Result<session::Model> {
        let topic = booking.topic.trim();
        if topic.is_empty() {
            return Err(BookingError::validation("Topic is required"));
        }

        let mentor = self
            .directory
            .find(booking.mentor_id)
            .await?
            .ok_or(BookingError::MentorNotFound(booking.mentor_id))?;
        if !mentor.is_bookable_mentor() {
            warn!(mentor_id = %mentor.id, role = ?mentor.role, approved = mentor.is_approved, active = mentor.is_active, "booking refused for invalid mentor");
            return Err(BookingError::InvalidMentor(mentor.id));
        }

        let slot = Interval::session_at(booking.start_time);

        let created = {
            let _guard = self.locks.acquire(mentor.id).await;
            let txn = self.conn.begin().await?;

            let booked = active_bookings(&txn, mentor.id).await?;
            if let Some(existing) = find_conflict(&booked, &slot) {
                info!(mentor_id = %mentor.id, existing = %existing.session_id, start = %slot.start, "time slot conflict");
                return Err(BookingError::Conflict {
                    existing: existing.session_id,
                });
            }

            let now = Utc::now();
            let model = SessionActiveModel {
                id: Set(Uuid::new_v4()),
                mentee_id: Set(booking.mentee_id),
                mentor_id: Set(mentor.id),
                start_time: Set(slot.start),
                end_time: Set(slot.end),
                topic: Set(topic.to_string()),
                status: Set(SessionStatus::Pending),
                rejection_reason: Set(None),
                meeting_link: Set(None),
                meeting_id: Set(None),
                meeting_password: Set(None),
                reviewed_by_mentee: Set(false),
                reviewed_by_mentor: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;

            txn.commit().await?;
            model
        };

        info!(session_id = %created.id, mentor_id = %created.mentor_id, mentee_id = %created.mentee_id, start = %created.start_time, "session requested");

        if let Some((mentee, mentor)) = self.parties(&created).await {
            self.notifier.booking_submitted(&created, &mentee, &mentor).await;
        }

        Ok(created)
    }

    pub async fn get(&self, session_id: Uuid) -> Result<session::Model> {
        SessionEntity::find_by_id(session_id)
            .one(&self.conn)
            .await?
            .ok_or(BookingError::SessionNotFound(session_id))
    }

    /// Every session the user takes part in, latest start first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<session::Model>> {
        let mut sessions = SessionEntity::find()
            .filter(
                Condition::any()
                    .add(session::Column::MenteeId.eq(user_id))
                    .add(session::Column::MentorId.eq(user_id)),
            )
            .order_by_desc(session::Column::StartTime)
            .all(&self.conn)
            .await?;
        // Keep the order independent of how the backend compares timestamps.
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    /// Intervals currently held on the mentor's calendar.
    pub async fn booked_intervals(&self, mentor_id: Uuid) -> Result<Vec<Interval>> {
        Ok(active_bookings(&self.conn, mentor_id)
            .await?
            .into_iter()
            .map(|b| b.interval)
            .collect())
    }

    /// Accepts a pending request and attaches a meeting.
    ///
    /// Never fails because of the meeting provider; a fallback meeting is
    /// attached instead.
    pub async fn confirm(&self, session_id: Uuid, actor: Uuid) -> Result<Confirmation> {
        let session = self.load_for(session_id, actor, Transition::Confirm).await?;
        let parties = self.parties(&session).await;
        let mentee_name = parties
            .as_ref()
            .map(|(mentee, _)| mentee.full_name.as_str())
            .unwrap_or("your mentee");

        let provisioned = self
            .provisioner
            .provision(&MeetingContext {
                session_id: session.id,
                topic: &session.topic,
                start_time: session.start_time,
                mentee_name,
            })
            .await;

        let changes = SessionActiveModel {
            meeting_link: Set(Some(provisioned.meeting.join_url.clone())),
            meeting_id: Set(Some(provisioned.meeting.meeting_id.clone())),
            meeting_password: Set(Some(provisioned.meeting.password.clone())),
            ..Default::default()
        };

        let confirmed = match self.apply(&session, Transition::Confirm, changes).await {
            Ok(confirmed) => confirmed,
            Err(error) => {
                // Lost a race with another transition; drop the orphan meeting.
                if provisioned.created_remotely() {
                    self.provisioner
                        .deprovision(&provisioned.meeting.meeting_id)
                        .await;
                }
                return Err(error);
            }
        };

        info!(session_id = %confirmed.id, meeting_id = ?confirmed.meeting_id, remote = provisioned.created_remotely(), "session confirmed");

        if let Some((mentee, mentor)) = &parties {
            self.notifier.booking_confirmed(&confirmed, mentee, mentor).await;
        }

        Ok(Confirmation {
            session: confirmed,
            meeting_created: provisioned.created_remotely(),
        })
    }

    /// Declines a pending request. A blank reason stores
    /// [`DEFAULT_REJECTION_REASON`].
    pub async fn reject(&self, session_id: Uuid, actor: Uuid, reason: Option<&str>) -> Result<session::Model> {
        let session = self.load_for(session_id, actor, Transition::Reject).await?;

        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REJECTION_REASON);

        let changes = SessionActiveModel {
            rejection_reason: Set(Some(reason.to_string())),
            ..Default::default()
        };
        let rejected = self.apply(&session, Transition::Reject, changes).await?;

        info!(session_id = %rejected.id, reason, "session rejected");

        if let Some((mentee, mentor)) = self.parties(&rejected).await {
            self.notifier.booking_rejected(&rejected, &mentee, &mentor).await;
        }

        Ok(rejected)
    }

    /// Marks a confirmed session as held. The remote meeting is deleted on a
    /// best-effort basis; the meeting fields stay on the record.
    pub async fn complete(&self, session_id: Uuid, actor: Uuid) -> Result<session::Model> {
        let session = self.load_for(session_id, actor, Transition::Complete).await?;
        let completed = self
            .apply(
                &session,
                Transition::Complete,
                SessionActiveModel {
                    ..Default::default()
                },
            )
            .await?;

        info!(session_id = %completed.id, "session completed");

        if let Some(meeting_id) = &completed.meeting_id {
            self.provisioner.deprovision(meeting_id).await;
        }

        Ok(completed)
    }

    /// Withdraws a pending or confirmed session and tells the other party.
    pub async fn cancel(&self, session_id: Uuid, actor: Uuid) -> Result<Cancellation> {
        let observed = self.load_for(session_id, actor, Transition::Cancel).await?;
        self.cancel_observed(observed, actor).await
    }

    /// Cancels starting from a previously read copy of the session.
    ///
    /// If the stored status moved on to another cancellable status (a pending
    /// request confirmed meanwhile), the session is re-read and the update
    /// retried once.
    async fn cancel_observed(&self, observed: session::Model, actor: Uuid) -> Result<Cancellation> {
        let changes = SessionActiveModel {
            meeting_link: Set(None),
            meeting_id: Set(None),
            meeting_password: Set(None),
            ..Default::default()
        };

        let (session, cancelled) = match self.apply(&observed, Transition::Cancel, changes.clone()).await {
            Ok(cancelled) => (observed, cancelled),
            Err(BookingError::InvalidState { status, .. }) if Transition::Cancel.sources().contains(&status) => {
                let current = self.load_for(observed.id, actor, Transition::Cancel).await?;
                let cancelled = self.apply(&current, Transition::Cancel, changes).await?;
                (current, cancelled)
            }
            Err(error) => return Err(error),
        };

        info!(session_id = %cancelled.id, by = %actor, previous = %session.status, "session cancelled");

        let mut warning = None;
        if session.status == SessionStatus::Confirmed {
            if let Some(meeting_id) = &session.meeting_id {
                if self.provisioner.deprovision(meeting_id).await == MeetingRelease::Failed {
                    warning = Some(format!(
                        "Session cancelled, but meeting {meeting_id} could not be deleted"
                    ));
                }
            }
        }

        if let Some((mentee, mentor)) = self.parties(&cancelled).await {
            let recipient = if cancelled.counterpart_of(actor) == mentee.id {
                &mentee
            } else {
                &mentor
            };
            self.notifier.booking_cancelled(&cancelled, recipient).await;
        }

        Ok(Cancellation {
            session: cancelled,
            warning,
        })
    }

    /// Loads a session and checks existence, actor, and source status, in
    /// that order.
    async fn load_for(&self, session_id: Uuid, actor: Uuid, transition: Transition) -> Result<session::Model> {
        let session = self.get(session_id).await?;
        if !transition.permits(&session, actor) {
            warn!(%session_id, %actor, action = transition.verb(), "unauthorized transition attempt");
            return Err(BookingError::Forbidden);
        }
        if !transition.sources().contains(&session.status) {
            return Err(BookingError::InvalidState {
                action: transition.verb(),
                status: session.status,
            });
        }
        Ok(session)
    }

    /// Writes `changes` plus the target status, only if the stored status is
    /// still the one observed in `session`.
    async fn apply(
        &self,
        session: &session::Model,
        transition: Transition,
        mut changes: SessionActiveModel,
    ) -> Result<session::Model> {
        changes.status = Set(transition.target());
        changes.updated_at = Set(Utc::now());

        let result = SessionEntity::update_many()
            .set(changes)
            .filter(session::Column::Id.eq(session.id))
            .filter(session::Column::Status.eq(session.status))
            .exec(&self.conn)
            .await?;

        let current = self.get(session.id).await?;
        if result.rows_affected == 0 {
            return Err(BookingError::InvalidState {
                action: transition.verb(),
                status: current.status,
            });
        }
        Ok(current)
    }

    /// Mentee and mentor records for notifications. Lookup failures are
    /// logged; the caller skips notifying.
    async fn parties(&self, session: &session::Model) -> Option<(user::Model, user::Model)> {
        let mut users = match self
            .directory
            .find_many([session.mentee_id, session.mentor_id])
            .await
        {
            Ok(users) => users,
            Err(error) => {
                warn!(session_id = %session.id, %error, "could not load session parties");
                return None;
            }
        };
        match (users.remove(&session.mentee_id), users.remove(&session.mentor_id)) {
            (Some(mentee), Some(mentor)) => Some((mentee, mentor)),
            _ => {
                warn!(session_id = %session.id, "session party missing from directory");
                None
            }
        }
    }
}

async fn active_bookings<C: ConnectionTrait>(db: &C, mentor_id: Uuid) -> Result<Vec<Booked>> {
    let sessions = SessionEntity::find()
        .filter(session::Column::MentorId.eq(mentor_id))
        .filter(session::Column::Status.is_in(SessionStatus::ACTIVE))
        .all(db)
        .await?;
    Ok(sessions
        .into_iter()
        .map(|s| Booked {
            session_id: s.id,
            interval: Interval {
                start: s.start_time,
                end: s.end_time,
            },
        })
        .collect())
}
