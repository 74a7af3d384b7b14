//! Fire-and-forget transactional notifications.
//!
//! Booking operations hand messages to a [`Notifier`], which delivers them
//! through a [`NotificationSink`] under a timeout. Delivery failures are
//! logged and swallowed; they never fail or roll back a booking.

pub mod templates;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::entity::{session, user};

/// A file attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content: String,
}

/// A single outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("could not resolve recipients: {0}")]
    Recipients(String),

    #[error("notification delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Where notifications go (mail relay, queue, log).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Sink that only records notifications in the trace log.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(to = %notification.to, subject = %notification.subject, "notification dispatched");
        Ok(())
    }
}

/// Sink that keeps every delivered notification in memory.
///
/// Useful for tests and local development. A failing sink still records
/// attempts but reports a transport error for each one.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    sent: Arc<Mutex<Vec<Notification>>>,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of everything delivered so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn sent_to(&self, address: &str) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|n| n.to == address)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        if self.fail {
            return Err(NotifyError::Transport("memory sink configured to fail".into()));
        }
        Ok(())
    }
}

/// Source of the current admin addresses for broadcast events.
#[async_trait]
pub trait AdminRecipients: Send + Sync {
    async fn admin_emails(&self) -> Result<Vec<String>, NotifyError>;
}

/// A mentor submitted their profile for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentorApplication {
    pub full_name: String,
    pub university: String,
}

/// Front door for booking side effects.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    timeout: Duration,
    client_url: String,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            timeout: Duration::from_secs(5),
            client_url: "http://localhost:3000".to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the front-end origin linked from notification bodies.
    pub fn with_client_url(mut self, client_url: impl Into<String>) -> Self {
        self.client_url = client_url.into();
        self
    }

    /// Delivers one notification. Never fails.
    pub async fn send(&self, notification: Notification) {
        let outcome = match tokio::time::timeout(self.timeout, self.sink.deliver(&notification)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(self.timeout)),
        };
        if let Err(error) = outcome {
            warn!(to = %notification.to, subject = %notification.subject, %error, "notification failed");
        }
    }

    pub async fn booking_submitted(&self, session: &session::Model, mentee: &user::Model, mentor: &user::Model) {
        self.send(templates::request_submitted(session, mentee, mentor)).await;
        self.send(templates::action_required(session, mentee, mentor)).await;
    }

    pub async fn booking_confirmed(&self, session: &session::Model, mentee: &user::Model, mentor: &user::Model) {
        self.send(templates::confirmed_for_mentee(session, mentee, mentor)).await;
        self.send(templates::confirmed_for_mentor(session, mentee, mentor)).await;
    }

    pub async fn booking_rejected(&self, session: &session::Model, mentee: &user::Model, mentor: &user::Model) {
        self.send(templates::rejected(session, mentee, mentor, &self.client_url)).await;
    }

    /// Tells `recipient` that the other party cancelled.
    pub async fn booking_cancelled(&self, session: &session::Model, recipient: &user::Model) {
        self.send(templates::cancelled(session, recipient)).await;
    }

    /// Broadcasts a mentor application to every current admin.
    ///
    /// Returns how many admins were notified.
    pub async fn mentor_application(&self, recipients: &dyn AdminRecipients, application: &MentorApplication) -> usize {
        let admins = match recipients.admin_emails().await {
            Ok(admins) => admins,
            Err(error) => {
                warn!(%error, "skipping mentor application broadcast");
                return 0;
            }
        };
        for admin in &admins {
            self.send(templates::mentor_application(admin, application)).await;
        }
        admins.len()
    }
}
