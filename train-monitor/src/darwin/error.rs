//! Schedule source error types.

use std::fmt;

use crate::domain::Crs;

/// Errors from a single fetch attempt against an upstream backend.
#[derive(Debug)]
pub enum SourceError {
    /// HTTP request failed (network error, timeout, etc.)
    Http(reqwest::Error),

    /// JSON deserialization failed
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code
    Api { status: u16, message: String },

    /// Rate limited by the API
    RateLimited,

    /// Invalid API key or unauthorized
    Unauthorized,

    /// Backend client could not be constructed
    Session(String),

    /// Scripted backend ran out of queued outcomes
    ScriptExhausted,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Http(e) => write!(f, "HTTP error: {e}"),
            SourceError::Json { message, body } => {
                write!(f, "JSON parse error: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
            SourceError::Api { status, message } => {
                write!(f, "API error {status}: {message}")
            }
            SourceError::RateLimited => write!(f, "rate limited by upstream API"),
            SourceError::Unauthorized => write!(f, "unauthorized (invalid API key)"),
            SourceError::Session(msg) => write!(f, "session init failed: {msg}"),
            SourceError::ScriptExhausted => write!(f, "scripted backend has no queued outcome"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Http(err)
    }
}

/// A fetch that exhausted all of its retry attempts.
///
/// Carries the station and backend so a log line from any station task is
/// attributable on its own.
#[derive(Debug)]
pub struct UpstreamError {
    pub station: Crs,
    pub backend: &'static str,
    pub attempts: u32,
    pub source: SourceError,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} fetch failed after {} attempts: {}",
            self.station, self.backend, self.attempts, self.source
        )
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
