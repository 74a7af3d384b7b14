//! Video-meeting provisioning with a guaranteed fallback.
//!
//! [`Provisioner`] wraps a remote [`MeetingProvider`]. Creating a meeting
//! never fails from the caller's point of view: any provider error, or a call
//! that outlives the configured timeout, is logged and replaced by a
//! synthesized [`FallbackMeetings`] record. Deleting is best-effort.

pub mod zoom;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::schedule::SESSION_MINUTES;

/// Passcode embedded in fallback join URLs and returned as their password.
pub const FALLBACK_PASSCODE: &str = "mentorconnect";

/// Outbound request to create a scheduled meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRequest {
    pub topic: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub agenda: String,
}

impl MeetingRequest {
    pub fn start_time_iso(&self) -> String {
        self.start_time.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// A provisioned meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub meeting_id: String,
    pub join_url: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("meeting provider credentials are not configured")]
    NotConfigured,

    #[error("meeting provider authentication failed: {0}")]
    Auth(String),

    #[error("meeting provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("meeting provider answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("meeting provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("meeting provider returned an unusable meeting: {0}")]
    Malformed(String),
}

/// A remote video-meeting service.
#[async_trait]
pub trait MeetingProvider: Send + Sync {
    async fn create_meeting(&self, request: &MeetingRequest) -> Result<Meeting, ProviderError>;

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), ProviderError>;
}

/// What the provisioner needs to know about the session being confirmed.
#[derive(Debug, Clone)]
pub struct MeetingContext<'a> {
    pub session_id: Uuid,
    pub topic: &'a str,
    pub start_time: DateTime<Utc>,
    pub mentee_name: &'a str,
}

impl MeetingContext<'_> {
    fn request(&self) -> MeetingRequest {
        MeetingRequest {
            topic: format!("MentorConnect: {}", self.topic),
            start_time: self.start_time,
            duration_minutes: SESSION_MINUTES,
            agenda: format!("Session with {}", self.mentee_name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingSource {
    Provider,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub meeting: Meeting,
    pub source: MeetingSource,
}

impl Provisioned {
    /// Whether the meeting exists at the remote provider.
    pub fn created_remotely(&self) -> bool {
        self.source == MeetingSource::Provider
    }
}

/// Outcome of a best-effort meeting deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingRelease {
    Deleted,
    /// No provider is configured, so there is nothing remote to delete.
    NoProvider,
    Failed,
}

/// Generator for synthesized meetings used when the provider is unavailable.
#[derive(Debug, Clone)]
pub struct FallbackMeetings {
    base_url: String,
}

impl FallbackMeetings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Synthesizes a meeting with a nine-digit numeric id.
    pub fn generate(&self, session_id: Uuid) -> Meeting {
        let id: u32 = rand::thread_rng().gen_range(100_000_000..=999_999_999);
        Meeting {
            meeting_id: id.to_string(),
            join_url: format!(
                "{}/j/{id}?pwd={FALLBACK_PASSCODE}&session={session_id}",
                self.base_url
            ),
            password: FALLBACK_PASSCODE.to_string(),
        }
    }
}

impl Default for FallbackMeetings {
    fn default() -> Self {
        Self::new("https://zoom.us")
    }
}

/// Provider wrapper applied on confirmation, completion, and cancellation.
#[derive(Clone)]
pub struct Provisioner {
    provider: Option<Arc<dyn MeetingProvider>>,
    timeout: Duration,
    fallback: FallbackMeetings,
}

impl Provisioner {
    pub fn new(provider: Arc<dyn MeetingProvider>) -> Self {
        Self {
            provider: Some(provider),
            timeout: Duration::from_secs(10),
            fallback: FallbackMeetings::default(),
        }
    }

    /// A provisioner with no remote provider; every meeting is a fallback.
    pub fn fallback_only() -> Self {
        Self {
            provider: None,
            timeout: Duration::from_secs(10),
            fallback: FallbackMeetings::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackMeetings) -> Self {
        self.fallback = fallback;
        self
    }

    /// Creates a meeting for the session, falling back on any failure.
    pub async fn provision(&self, context: &MeetingContext<'_>) -> Provisioned {
        let Some(provider) = &self.provider else {
            info!(session_id = %context.session_id, "no meeting provider configured, using fallback meeting");
            return self.fallback(context.session_id);
        };

        let request = context.request();
        let outcome = match tokio::time::timeout(self.timeout, provider.create_meeting(&request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };

        match outcome.and_then(validate) {
            Ok(meeting) => {
                info!(session_id = %context.session_id, meeting_id = %meeting.meeting_id, "meeting created");
                Provisioned {
                    meeting,
                    source: MeetingSource::Provider,
                }
            }
            Err(error) => {
                warn!(session_id = %context.session_id, %error, "meeting creation failed, using fallback meeting");
                self.fallback(context.session_id)
            }
        }
    }

    /// Deletes a remote meeting. Failures are logged and never raised.
    pub async fn deprovision(&self, meeting_id: &str) -> MeetingRelease {
        let Some(provider) = &self.provider else {
            debug!(meeting_id, "no meeting provider configured, nothing to delete");
            return MeetingRelease::NoProvider;
        };

        let outcome = match tokio::time::timeout(self.timeout, provider.delete_meeting(meeting_id)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(()) => {
                info!(meeting_id, "meeting deleted");
                MeetingRelease::Deleted
            }
            Err(error) => {
                warn!(meeting_id, %error, "failed to delete meeting");
                MeetingRelease::Failed
            }
        }
    }

    fn fallback(&self, session_id: Uuid) -> Provisioned {
        Provisioned {
            meeting: self.fallback.generate(session_id),
            source: MeetingSource::Fallback,
        }
    }
}

fn validate(meeting: Meeting) -> Result<Meeting, ProviderError> {
    if meeting.meeting_id.is_empty() || meeting.join_url.is_empty() {
        return Err(ProviderError::Malformed(format!("{meeting:?}")));
    }
    Ok(meeting)
}
