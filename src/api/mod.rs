//! HTTP surface for the booking ledger.
//!
//! Handlers only check request shape and caller role, then delegate to
//! [`SessionLedger`]. Every route expects a `tower-sessions` layer carrying an
//! authenticated [`Caller`].

pub mod auth;
pub mod extract;
mod handlers;
pub mod projection;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;

use crate::{
    availability::AvailabilityStore, directory::UserDirectory, ledger::SessionLedger,
    meeting::Provisioner, notify::Notifier,
};

pub use auth::{sign_in, sign_out, Caller, CALLER_KEY};
pub use projection::{project, project_or_unknown, PartyView, SessionView};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<SessionLedger>,
    pub availability: AvailabilityStore,
    pub directory: UserDirectory,
}

impl AppState {
    pub fn new(conn: DatabaseConnection, provisioner: Provisioner, notifier: Notifier) -> Self {
        Self {
            ledger: Arc::new(SessionLedger::new(conn.clone(), provisioner, notifier)),
            availability: AvailabilityStore::new(conn.clone()),
            directory: UserDirectory::new(conn),
        }
    }
}

/// Booking and availability routes, without state or session layer.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(handlers::create_booking))
        .route("/bookings/my", get(handlers::my_bookings))
        .route("/bookings/{id}/confirm", post(handlers::confirm_booking))
        .route("/bookings/{id}/reject", post(handlers::reject_booking))
        .route("/bookings/{id}/complete", post(handlers::complete_booking))
        .route("/bookings/{id}/cancel", delete(handlers::cancel_booking))
        .route("/mentors/availability", put(handlers::update_availability))
        .route("/mentors/{id}/slots", get(handlers::mentor_slots))
}

/// Routes bound to their state. Callers add a `SessionManagerLayer` on top.
pub fn router(state: AppState) -> Router {
    routes().with_state(state)
}
