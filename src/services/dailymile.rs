// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dailymile API client and wire types.
//!
//! Handles:
//! - OAuth code exchange and username lookup
//! - Entry listing (one page per call)
//! - Entry creation and track attachment
//!
//! Every request acquires a permit from the shared [`RateGate`] right before
//! it is sent.

use crate::error::AppError;
use crate::services::mapping::RemoteDistance;
use crate::services::rate_limit::RateGate;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Content type Dailymile expects for track uploads.
pub const GPX_CONTENT_TYPE: &str = "application/gpx+xml";

/// OAuth scopes requested from Dailymile.
const OAUTH_SCOPE: &str = "write view_private";

/// Dailymile API client.
#[derive(Clone)]
pub struct DailymileClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    rate_gate: Arc<dyn RateGate>,
}

impl DailymileClient {
    /// Create a new Dailymile client with OAuth credentials.
    pub fn new(
        base_url: impl Into<String>,
        client_id: String,
        client_secret: String,
        rate_gate: Arc<dyn RateGate>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            rate_gate,
        }
    }

    /// Dailymile does not use bearer tokens.
    fn auth_header(access_token: &str) -> String {
        format!("access_token {}", access_token)
    }

    /// Browser URL that starts the OAuth flow.
    pub fn authorization_url(&self, redirect_uri: &str) -> String {
        format!(
            "{}/oauth/authorize?scope={}&client_id={}&response_type=code&redirect_uri={}",
            self.base_url,
            urlencoding::encode(OAUTH_SCOPE),
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri)
        )
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenExchangeResponse, AppError> {
        let url = format!("{}/oauth/token", self.base_url);

        self.rate_gate.acquire().await;
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Token exchange failed: {}", e)))?;

        if response.status().as_u16() != 200 {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Dailymile token exchange failed");
            return Err(AppError::DailymileApi {
                status: status.as_u16(),
                message: "Invalid code".to_string(),
            });
        }

        response.json().await.map_err(|e| AppError::DailymileApi {
            status: 200,
            message: format!("Failed to parse token response: {}", e),
        })
    }

    /// Resolve an access token to the account it belongs to.
    pub async fn get_me(&self, access_token: &str) -> Result<DailymilePerson, AppError> {
        let url = format!("{}/people/me.json", self.base_url);

        self.rate_gate.acquire().await;
        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, Self::auth_header(access_token))
            .send()
            .await?;

        self.check_response_json(response).await
    }

    /// Fetch one page of entries, newest first, before `until`.
    ///
    /// `until = None` asks for the most recent page. Entries are returned
    /// undecoded so one malformed entry cannot sink the page.
    pub async fn list_entries(
        &self,
        access_token: &str,
        username: &str,
        until: Option<i64>,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        let url = format!(
            "{}/people/{}/entries.json",
            self.base_url,
            urlencoding::encode(username)
        );

        let mut request = self
            .http
            .get(&url)
            .header(AUTHORIZATION, Self::auth_header(access_token));
        if let Some(until) = until {
            request = request.query(&[("until", until.to_string())]);
        }

        self.rate_gate.acquire().await;
        let response = request.send().await?;

        let page: EntriesResponse = self.check_response_json(response).await?;
        Ok(page.into_entries())
    }

    /// POST a new entry. The caller interprets the status and body.
    pub async fn create_entry(
        &self,
        access_token: &str,
        entry: &NewEntry,
    ) -> Result<RawResponse, AppError> {
        let url = format!("{}/entries.json", self.base_url);
        let request = self
            .http
            .post(&url)
            .header(AUTHORIZATION, Self::auth_header(access_token))
            .json(entry);

        self.rate_gate.acquire().await;
        let response = request.send().await?;
        RawResponse::read(response).await
    }

    /// PUT a GPX track onto an existing entry. The caller interprets the
    /// status and body.
    pub async fn attach_track(
        &self,
        access_token: &str,
        entry_id: u64,
        gpx: Vec<u8>,
    ) -> Result<RawResponse, AppError> {
        let url = format!("{}/entries/{}/track.json", self.base_url, entry_id);
        let request = self
            .http
            .put(&url)
            .header(AUTHORIZATION, Self::auth_header(access_token))
            .header(CONTENT_TYPE, GPX_CONTENT_TYPE)
            .body(gpx);

        self.rate_gate.acquire().await;
        let response = request.send().await?;
        RawResponse::read(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::AuthorizationRequired(format!(
                    "Dailymile rejected the access token: {}",
                    body
                )));
            }

            return Err(AppError::DailymileApi {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| AppError::DailymileApi {
            status: status.as_u16(),
            message: format!("JSON parse error: {}", e),
        })
    }
}

/// Status and body of a write request, kept verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    async fn read(response: reqwest::Response) -> Result<Self, AppError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(Self { status, body })
    }
}

/// Token exchange response from Dailymile OAuth.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
}

/// `GET /people/me.json`
#[derive(Debug, Clone, Deserialize)]
pub struct DailymilePerson {
    pub username: String,
}

/// Entry list body: current API wraps the list, older responses are bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntriesResponse {
    Bare(Vec<serde_json::Value>),
    Page {
        #[serde(default)]
        entries: Option<Vec<serde_json::Value>>,
    },
}

impl EntriesResponse {
    fn into_entries(self) -> Vec<serde_json::Value> {
        match self {
            EntriesResponse::Bare(entries) => entries,
            EntriesResponse::Page { entries } => entries.unwrap_or_default(),
        }
    }
}

/// One entry from the people/entries feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailymileEntry {
    pub id: u64,
    /// Completion time, `%Y-%m-%dT%H:%M:%SZ`
    pub at: String,
    #[serde(default)]
    pub message: Option<String>,
    /// Absent for posts that only carry media.
    #[serde(default)]
    pub workout: Option<DailymileWorkout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailymileWorkout {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub activity_type: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub distance: Option<DailymileDistance>,
}

/// Distance exactly as the user entered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailymileDistance {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub units: Option<String>,
}

/// `POST /entries.json` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub workout: NewWorkout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWorkout {
    pub title: String,
    pub activity_type: &'static str,
    /// Whole seconds
    pub duration: i64,
    pub completed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<RemoteDistance>,
}

/// Body of a 201 from `POST /entries.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedEntry {
    pub id: u64,
}
