//! Mentor-declared availability.
//!
//! Declared slots are never mutated by bookings. What callers see as open is
//! derived: declared future slots minus the intervals held by pending or
//! confirmed sessions.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait};
use tracing::info;
use uuid::Uuid;

use crate::{
    entity::{
        availability_slot::{self, ActiveModel as SlotActiveModel, Entity as SlotEntity},
        user::{self, Role},
    },
    error::{BookingError, Result},
    ledger::SessionLedger,
    schedule::{normalize_slots, open_slots},
};

#[derive(Debug, Clone)]
pub struct AvailabilityStore {
    conn: DatabaseConnection,
}

impl AvailabilityStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Replaces the mentor's declared slots. Past instants and duplicates are
    /// dropped; the stored set is returned in ascending order.
    pub async fn replace(
        &self,
        mentor: &user::Model,
        slots: &[DateTime<Utc>],
        now: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        if mentor.role != Role::Mentor {
            return Err(BookingError::Forbidden);
        }
        let slots = normalize_slots(slots, now);

        let txn = self.conn.begin().await?;
        SlotEntity::delete_many()
            .filter(availability_slot::Column::MentorId.eq(mentor.id))
            .exec(&txn)
            .await?;
        if !slots.is_empty() {
            SlotEntity::insert_many(slots.iter().map(|starts_at| SlotActiveModel {
                mentor_id: Set(mentor.id),
                starts_at: Set(*starts_at),
                ..Default::default()
            }))
            .exec(&txn)
            .await?;
        }
        txn.commit().await?;

        info!(mentor_id = %mentor.id, count = slots.len(), "availability updated");
        Ok(slots)
    }

    /// Every slot the mentor declared, ascending.
    pub async fn declared(&self, mentor_id: Uuid) -> Result<Vec<DateTime<Utc>>> {
        let mut slots: Vec<_> = SlotEntity::find()
            .filter(availability_slot::Column::MentorId.eq(mentor_id))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|slot| slot.starts_at)
            .collect();
        slots.sort();
        Ok(slots)
    }

    /// Future declared slots not covered by an active session.
    pub async fn open_slots(
        &self,
        mentor_id: Uuid,
        ledger: &SessionLedger,
        now: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let upcoming: Vec<_> = self
            .declared(mentor_id)
            .await?
            .into_iter()
            .filter(|slot| *slot > now)
            .collect();
        let booked = ledger.booked_intervals(mentor_id).await?;
        Ok(open_slots(&upcoming, &booked))
    }
}
