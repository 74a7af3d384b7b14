//! Time arithmetic for bookings.
//!
//! Every session occupies a half-open interval `[start, start + 60min)`.
//! Two intervals `[s1, e1)` and `[s2, e2)` overlap iff `s1 < e2 && s2 < e1`,
//! so back-to-back sessions (one ending exactly when the next starts) never
//! conflict.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

/// Fixed length of every session, in minutes.
pub const SESSION_MINUTES: i64 = 60;

/// Fixed length of every session.
pub fn session_length() -> Duration {
    Duration::minutes(SESSION_MINUTES)
}

/// A half-open `[start, end)` span of time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// The slot a session starting at `start` occupies.
    ///
    /// Sub-second precision is dropped so stored instants compare cleanly.
    pub fn session_at(start: DateTime<Utc>) -> Self {
        let start = start.trunc_subsecs(0);
        Self {
            start,
            end: start + session_length(),
        }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// An interval already held on a mentor's calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Booked {
    pub session_id: Uuid,
    pub interval: Interval,
}

/// Returns the first booked interval that overlaps `candidate`.
pub fn find_conflict<'a, I>(booked: I, candidate: &Interval) -> Option<Booked>
where
    I: IntoIterator<Item = &'a Booked>,
{
    booked
        .into_iter()
        .find(|b| b.interval.overlaps(candidate))
        .copied()
}

/// Normalizes a mentor's declared slots: drops instants at or before `now`,
/// truncates to whole seconds, sorts, and removes duplicates.
pub fn normalize_slots(slots: &[DateTime<Utc>], now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut out: Vec<_> = slots
        .iter()
        .map(|s| s.trunc_subsecs(0))
        .filter(|s| *s > now)
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Declared slots whose one-hour window is not covered by an active session.
pub fn open_slots(declared: &[DateTime<Utc>], booked: &[Interval]) -> Vec<DateTime<Utc>> {
    declared
        .iter()
        .copied()
        .filter(|slot| {
            let window = Interval::session_at(*slot);
            !booked.iter().any(|b| b.overlaps(&window))
        })
        .collect()
}
