// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Adapter error types.
//!
//! Per-entry problems (unsupported activity type or distance unit) are not
//! errors: they become [`ExclusionRecord`](crate::models::ExclusionRecord)s
//! and the listing carries on. Everything here aborts the current operation.

/// Error returned by every fallible adapter operation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Dailymile answered 401. The user has to re-authorize; never retried.
    #[error("Authorization required: {0}")]
    AuthorizationRequired(String),

    #[error("Dailymile API error (HTTP {status}): {message}")]
    DailymileApi { status: u16, message: String },

    #[error("Unable to upload activity {uid} (HTTP {status}): {body}")]
    UploadFailed { uid: String, status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Track rendering failed: {0}")]
    TrackRender(String),

    #[error("Cache store error: {0}")]
    Cache(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for HTTP 401 responses on any call.
    pub fn is_authorization_error(&self) -> bool {
        matches!(self, AppError::AuthorizationRequired(_))
    }

    /// Whether the platform must ask the user to act before syncing again.
    pub fn requires_user_intervention(&self) -> bool {
        self.is_authorization_error()
    }

    /// HTTP status attached to the error, if the remote produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::AuthorizationRequired(_) => Some(401),
            AppError::DailymileApi { status, .. } | AppError::UploadFailed { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AppError>;
