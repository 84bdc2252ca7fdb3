//! Dailymile credential handed over by the platform.

use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth access token plus the Dailymile username it belongs to.
///
/// Dailymile tokens never expire and cannot be revoked, so there is no
/// refresh token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCredential {
    pub access_token: String,
    /// Dailymile username (external account id)
    pub username: String,
}

impl RemoteCredential {
    pub fn new(access_token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            username: username.into(),
        }
    }
}

impl fmt::Debug for RemoteCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCredential")
            .field("access_token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}
