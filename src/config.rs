//! Environment-driven configuration for the booking server.

use std::{env, net::SocketAddr, time::Duration};

use crate::meeting::zoom::ZoomCredentials;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_CLIENT_URL: &str = "http://localhost:3000";
const DEFAULT_FALLBACK_MEETING_BASE_URL: &str = "https://zoom.us";
const DEFAULT_MEETING_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SESSION_INACTIVITY_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the server binary.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// `None` when any Zoom credential is absent; confirmations then use
    /// fallback meetings.
    pub zoom: Option<ZoomCredentials>,
    pub meeting_timeout: Duration,
    pub notify_timeout: Duration,
    pub fallback_meeting_base_url: String,
    /// Front-end origin used for links inside notification bodies.
    pub client_url: String,
    pub session_inactivity: time::Duration,
}

impl BookingConfig {
    /// Reads configuration from the process environment.
    ///
    /// Only `DATABASE_URL` is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = parse_or(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?;

        let zoom = match (
            lookup("ZOOM_ACCOUNT_ID"),
            lookup("ZOOM_CLIENT_ID"),
            lookup("ZOOM_CLIENT_SECRET"),
        ) {
            (Some(account_id), Some(client_id), Some(client_secret)) => Some(ZoomCredentials {
                account_id,
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let meeting_timeout = Duration::from_secs(parse_or(
            &lookup,
            "MEETING_TIMEOUT_SECS",
            Some(DEFAULT_MEETING_TIMEOUT_SECS),
        )?);
        let notify_timeout = Duration::from_secs(parse_or(
            &lookup,
            "NOTIFY_TIMEOUT_SECS",
            Some(DEFAULT_NOTIFY_TIMEOUT_SECS),
        )?);
        let inactivity_hours: i64 = parse_or(
            &lookup,
            "SESSION_INACTIVITY_HOURS",
            Some(DEFAULT_SESSION_INACTIVITY_HOURS),
        )?;

        Ok(Self {
            database_url,
            bind_addr,
            zoom,
            meeting_timeout,
            notify_timeout,
            fallback_meeting_base_url: lookup("FALLBACK_MEETING_BASE_URL")
                .unwrap_or_else(|| DEFAULT_FALLBACK_MEETING_BASE_URL.to_string()),
            client_url: lookup("CLIENT_URL").unwrap_or_else(|| DEFAULT_CLIENT_URL.to_string()),
            session_inactivity: time::Duration::hours(inactivity_hours),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}
