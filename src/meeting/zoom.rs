//! Zoom server-to-server OAuth meeting provider.

use std::fmt;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Meeting, MeetingProvider, MeetingRequest, ProviderError};

const DEFAULT_OAUTH_BASE: &str = "https://zoom.us";
const DEFAULT_API_BASE: &str = "https://api.zoom.us/v2";

/// Server-to-server OAuth app credentials.
#[derive(Clone)]
pub struct ZoomCredentials {
    pub account_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ZoomCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoomCredentials")
            .field("account_id", &self.account_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct MeetingSettings {
    host_video: bool,
    participant_video: bool,
    join_before_host: bool,
    mute_upon_entry: bool,
    watermark: bool,
    use_pmi: bool,
    approval_type: u8,
    audio: &'static str,
    auto_recording: &'static str,
    waiting_room: bool,
}

#[derive(Debug, Serialize)]
struct CreateMeetingBody<'a> {
    topic: &'a str,
    #[serde(rename = "type")]
    kind: u8,
    start_time: String,
    duration: i64,
    timezone: &'static str,
    agenda: &'a str,
    settings: MeetingSettings,
}

impl<'a> CreateMeetingBody<'a> {
    fn scheduled(request: &'a MeetingRequest) -> Self {
        Self {
            topic: &request.topic,
            // 2 = scheduled meeting
            kind: 2,
            start_time: request.start_time_iso(),
            duration: request.duration_minutes,
            timezone: "UTC",
            agenda: &request.agenda,
            settings: MeetingSettings {
                host_video: true,
                participant_video: true,
                join_before_host: false,
                mute_upon_entry: true,
                watermark: false,
                use_pmi: false,
                approval_type: 0,
                audio: "both",
                auto_recording: "none",
                waiting_room: true,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedMeeting {
    id: u64,
    join_url: String,
    #[serde(default)]
    password: String,
}

/// [`MeetingProvider`] backed by the Zoom REST API.
#[derive(Debug, Clone)]
pub struct ZoomProvider {
    client: Client,
    credentials: ZoomCredentials,
    oauth_base: String,
    api_base: String,
}

impl ZoomProvider {
    pub fn new(credentials: ZoomCredentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
            oauth_base: DEFAULT_OAUTH_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Points the provider at different OAuth and API hosts.
    pub fn with_endpoints(mut self, oauth_base: impl Into<String>, api_base: impl Into<String>) -> Self {
        self.oauth_base = oauth_base.into();
        self.api_base = api_base.into();
        self
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let ZoomCredentials {
            account_id,
            client_id,
            client_secret,
        } = &self.credentials;
        if account_id.is_empty() || client_id.is_empty() || client_secret.is_empty() {
            return Err(ProviderError::NotConfigured);
        }

        let response = self
            .client
            .post(format!("{}/oauth/token", self.oauth_base))
            .query(&[
                ("grant_type", "account_credentials"),
                ("account_id", account_id.as_str()),
            ])
            .basic_auth(client_id, Some(client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!("{status}: {body}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl MeetingProvider for ZoomProvider {
    async fn create_meeting(&self, request: &MeetingRequest) -> Result<Meeting, ProviderError> {
        let token = self.access_token().await?;
        debug!(topic = %request.topic, "creating zoom meeting");

        let response = self
            .client
            .post(format!("{}/users/me/meetings", self.api_base))
            .bearer_auth(token)
            .json(&CreateMeetingBody::scheduled(request))
            .send()
            .await?;

        let created: CreatedMeeting = ensure_success(response).await?.json().await?;
        Ok(Meeting {
            meeting_id: created.id.to_string(),
            join_url: created.join_url,
            password: created.password,
        })
    }

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), ProviderError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .delete(format!("{}/meetings/{meeting_id}", self.api_base))
            .bearer_auth(token)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::{MeetingContext, MeetingSource, Provisioner};
    use chrono::{TimeZone, Utc};
    use std::{sync::Arc, time::Duration};
    use uuid::Uuid;

    fn credentials() -> ZoomCredentials {
        ZoomCredentials {
            account_id: "acct".into(),
            client_id: "client".into(),
            client_secret: "secret".into(),
        }
    }

    #[test]
    fn scheduled_body_matches_zoom_schema() {
        let request = MeetingRequest {
            topic: "MentorConnect: Essay review".into(),
            start_time: Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap(),
            duration_minutes: 60,
            agenda: "Session with Ada".into(),
        };
        let body = serde_json::to_value(CreateMeetingBody::scheduled(&request)).unwrap();
        assert_eq!(body["type"], 2);
        assert_eq!(body["start_time"], "2025-06-01T14:00:00Z");
        assert_eq!(body["duration"], 60);
        assert_eq!(body["timezone"], "UTC");
        assert_eq!(body["settings"]["waiting_room"], true);
    }

    #[test]
    fn debug_output_hides_the_client_secret() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("secret\""));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn blank_credentials_are_not_configured() {
        let provider = ZoomProvider::new(ZoomCredentials {
            account_id: String::new(),
            ..credentials()
        });
        let err = provider.delete_meeting("1").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured));
    }

    #[tokio::test]
    async fn unreachable_zoom_still_yields_a_meeting() {
        let provider = ZoomProvider::new(credentials())
            .with_endpoints("http://127.0.0.1:9", "http://127.0.0.1:9/v2");
        let provisioner = Provisioner::new(Arc::new(provider)).with_timeout(Duration::from_secs(2));
        let provisioned = provisioner
            .provision(&MeetingContext {
                session_id: Uuid::new_v4(),
                topic: "Essay review",
                start_time: Utc::now(),
                mentee_name: "Ada",
            })
            .await;
        assert_eq!(provisioned.source, MeetingSource::Fallback);
        assert!(!provisioned.meeting.join_url.is_empty());
    }
}
