//! Database entity models for mentor-bookings.
//!
//! These Sea-ORM entities define the schema the booking ledger reads and
//! writes. The ledger exclusively owns `sessions`; `users` and
//! `availability_slots` belong to the profile side and are read here.

/// Availability slots declared by mentors.
pub mod availability_slot;

/// Booked sessions and their lifecycle status.
pub mod session;

/// Platform users (mentees, mentors, admins).
pub mod user;
